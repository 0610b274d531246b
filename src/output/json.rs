use anyhow::{Context, Result};
use serde::Serialize;

pub fn render_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("failed serializing output as JSON")
}

#[cfg(test)]
mod tests {
    use super::render_json;
    use crate::policy::PolicyPreset;

    #[test]
    fn renders_policy_tables() {
        let json = render_json(&PolicyPreset::October2025.table()).expect("serializable");
        assert!(json.contains("\"id\": \"oct-2025\""));
        assert!(json.contains("\"rule\": \"stress_rate\""));
    }
}
