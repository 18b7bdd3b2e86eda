use icf_config::IcfConfig;

/// Emit warnings for likely mistyped env var keys that silently fell back to defaults.
pub fn warn_unconfigured(config: &IcfConfig) {
    for warning in collect_unconfigured_warnings(config, std::env::vars()) {
        tracing::warn!("{warning}");
    }
}

fn collect_unconfigured_warnings<I>(config: &IcfConfig, env: I) -> Vec<String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let env_keys = env.into_iter().map(|(key, _)| key).collect::<Vec<_>>();

    let sections = [
        ("Auth", config.auth.is_configured(), "ICFLOG_AUTH", "SECRET_KEY"),
        ("Stripe", config.stripe.is_configured(), "ICFLOG_STRIPE", "SECRET_KEY"),
        ("Calendly", config.calendly.is_configured(), "ICFLOG_CALENDLY", "CLIENT_ID"),
        ("Email", config.email.is_configured(), "ICFLOG_EMAIL", "API_KEY"),
        ("Push", config.push.is_configured(), "ICFLOG_PUSH", "VAPID_PUBLIC_KEY"),
        ("Storage", config.storage.is_configured(), "ICFLOG_STORAGE", "ACCOUNT_ID"),
    ];

    sections
        .into_iter()
        .filter(|(_, configured, prefix, _)| !configured && has_env_prefix(&env_keys, prefix))
        .map(|(name, _, prefix, example)| {
            format!(
                "{name} config appears incomplete while {prefix}* env vars exist. Use double underscores (example: {prefix}__{example})."
            )
        })
        .collect()
}

fn has_env_prefix(keys: &[String], prefix: &str) -> bool {
    keys.iter().any(|key| key.starts_with(prefix))
}
