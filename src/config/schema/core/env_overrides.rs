use super::Config;

impl Config {
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) =
            std::env::var("CHAINPILOT_API_KEY").or_else(|_| std::env::var("OPENAI_API_KEY"))
            && !key.is_empty()
        {
            self.reasoning.api_key = Some(key);
        }

        if let Ok(base_url) = std::env::var("CHAINPILOT_BASE_URL")
            && !base_url.is_empty()
        {
            self.reasoning.base_url = base_url;
        }

        if let Ok(model) = std::env::var("CHAINPILOT_MODEL")
            && !model.is_empty()
        {
            self.reasoning.model = model;
        }

        if let Ok(temp_str) = std::env::var("CHAINPILOT_TEMPERATURE")
            && let Ok(temp) = temp_str.parse::<f64>()
            && (0.0..=2.0).contains(&temp)
        {
            self.reasoning.temperature = temp;
        }

        if let Ok(path) = std::env::var("CHAINPILOT_PREFERENCES")
            && !path.is_empty()
        {
            self.preferences_path = Some(path);
        }
    }
}
