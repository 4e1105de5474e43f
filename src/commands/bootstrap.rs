use anyhow::{Context, Result};
use std::sync::Arc;

use slotwatch::auth::{Authenticator, EasydoctAuthenticator};
use slotwatch::config::{Config, NotificationConfig};
use slotwatch::notifications::{
    NotificationService, SlackChannel, SlackConfig, WebhookChannel, WebhookConfig,
};
use slotwatch::poller::{HttpAvailabilityClient, Poller};
use slotwatch::resolver::{HttpResolver, Resolver};
use slotwatch::session::SessionStore;

/// Validate the configuration and wire up a ready-to-run poller
///
/// Resolves exam/location names and performs the initial login when the
/// configured cookies are unusable. Any failure here is fatal.
pub async fn build_poller(mut config: Config) -> Result<(Arc<Poller>, Config)> {
    config.validate()?;

    resolve_names(&mut config).await?;

    let timeout = config.request_timeout();
    let authenticator: Arc<dyn Authenticator> = Arc::new(
        EasydoctAuthenticator::new()
            .with_login_url(config.login.login_url.clone())
            .with_timeout(timeout),
    );

    let mut credentials = config.credentials();
    let login = config.login_credentials();

    if let Some(login) = &login {
        if !credentials.is_valid() {
            tracing::info!("Auto-login enabled and no valid cookies found, performing initial login");
            credentials = authenticator
                .login(&login.email, &login.password, &login.target_url)
                .await
                .context("Initial login failed, cannot start watcher")?;

            if !credentials.is_valid() {
                anyhow::bail!("Initial login failed: session cookies incomplete");
            }
            tracing::info!("Initial login successful");
        }
    } else if !credentials.is_valid() {
        anyhow::bail!("Session cookies are missing or still set to placeholder values");
    }

    let mut client = HttpAvailabilityClient::new(&config.api.url, timeout)?;
    if let Some(referer) = &config.api.referer {
        client = client.with_referer(referer.clone());
    }

    let session = Arc::new(SessionStore::new(credentials));
    let notifier = Arc::new(build_notifier(&config.notifications)?);

    let mut poller = Poller::new(Arc::new(client), session, config.query_template()?, notifier)
        .with_notifications_enabled(config.notifications.enabled);

    if let Some(login) = login {
        poller = poller.with_auto_login(authenticator, login);
    }

    Ok((Arc::new(poller), config))
}

/// Fill in exam and location ids from their configured names
async fn resolve_names(config: &mut Config) -> Result<()> {
    let needs_exam = config.exam.exam_id.is_none() && config.exam.exam_name.is_some();
    let needs_location = config.exam.location_id.is_none() && config.exam.location_name.is_some();
    if !needs_exam && !needs_location {
        return Ok(());
    }

    let resolver = HttpResolver::new(config.request_timeout())?;

    if let (true, Some(name)) = (needs_exam, config.exam.exam_name.clone()) {
        let id = resolver
            .resolve_exam_id(&config.exam.exam_type_id, &name)
            .await
            .with_context(|| format!("Failed to resolve exam '{name}'"))?;
        config.exam.exam_id = Some(id);
    }

    if let (true, Some(name)) = (needs_location, config.exam.location_name.clone()) {
        let exam_id = config.exam.exam_id.clone().unwrap_or_default();
        let id = resolver
            .resolve_location_id(&config.exam.exam_type_id, &exam_id, &name)
            .await
            .with_context(|| format!("Failed to resolve location '{name}'"))?;
        config.exam.location_id = Some(id);
    }

    Ok(())
}

/// Build the notification fan-out from configuration
pub fn build_notifier(config: &NotificationConfig) -> Result<NotificationService> {
    let mut service = NotificationService::new();

    match (&config.slack_token, &config.slack_channel_id) {
        (Some(token), Some(channel_id)) => {
            service.add_channel(Box::new(SlackChannel::new(SlackConfig::new(
                token.clone(),
                channel_id.clone(),
            ))?));
        }
        (Some(_), None) | (None, Some(_)) => {
            tracing::warn!("Slack token or channel ID not configured, Slack notifications disabled");
        }
        (None, None) => {}
    }

    if let Some(url) = &config.webhook_url {
        service.add_channel(Box::new(WebhookChannel::new(WebhookConfig::new(url.clone()))?));
    }

    if config.enabled && service.channel_count() == 0 {
        tracing::warn!("Notifications enabled but no channel configured");
    }

    Ok(service)
}
