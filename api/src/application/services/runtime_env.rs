use std::collections::BTreeMap;

/// Global the front-end reads before its bundle boots.
pub const RUNTIME_GLOBAL: &str = "window.__env";

pub fn render_runtime_script(client_env: &BTreeMap<String, String>) -> anyhow::Result<String> {
    let json = serde_json::to_string_pretty(client_env)?;
    Ok(format!("{RUNTIME_GLOBAL} = {json}").trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_pretty_assignment() {
        let mut vars = BTreeMap::new();
        vars.insert("VITE_APP_URL".to_string(), "http://localhost:4000".to_string());
        let script = render_runtime_script(&vars).unwrap();
        assert_eq!(
            script,
            "window.__env = {\n  \"VITE_APP_URL\": \"http://localhost:4000\"\n}"
        );
    }

    #[test]
    fn empty_env_is_an_empty_object() {
        let script = render_runtime_script(&BTreeMap::new()).unwrap();
        assert_eq!(script, "window.__env = {}");
    }

    #[test]
    fn values_are_json_escaped() {
        let mut vars = BTreeMap::new();
        vars.insert("VITE_NAME".to_string(), "a\"b</script>".to_string());
        let script = render_runtime_script(&vars).unwrap();
        assert!(script.contains(r#""a\"b</script>""#));
    }
}
