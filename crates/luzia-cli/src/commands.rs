use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use tracing::{debug, info, warn};

use luzia_core::api::organizations::DEFAULT_LIST_LIMIT;
use luzia_core::api::{AuthApi, DashboardApi, HttpClient, OrganizationsApi};
use luzia_core::auth::{Session, SessionData, SessionEvent};
use luzia_core::config::Config;
use luzia_core::models::{DashboardOverview, OrganizationDetail};
use luzia_core::resource::{
    AsyncResource, PollingOptions, PollingScheduler, ResourcePhase, VisibilitySignal,
};

/// Everything a command needs: config, the stored session, and one client.
pub struct Context {
    pub config: Config,
    pub session: Arc<Session>,
    pub client: HttpClient,
}

impl Context {
    pub fn new() -> Result<Self> {
        let config = Config::load().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        });
        let cache_dir = config.cache_dir().unwrap_or_else(|_| PathBuf::from("./cache"));
        let session = Arc::new(Session::new(cache_dir));
        let client = HttpClient::builder(config.api_base_url())
            .session_store(session.clone())
            .build()?;
        Ok(Self {
            config,
            session,
            client,
        })
    }

    fn token(&self) -> Result<String> {
        self.session
            .token()?
            .ok_or_else(|| anyhow::anyhow!("Not logged in. Run `luzia login` first."))
    }
}

fn prompt_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

pub async fn login(mut ctx: Context, email: Option<String>) -> Result<()> {
    let email = match email.or_else(|| ctx.config.last_email.clone()) {
        Some(email) => email,
        None => prompt_line("Email: ")?,
    };
    if email.is_empty() {
        anyhow::bail!("Email is required");
    }
    let password = rpassword::prompt_password(format!("Password for {}: ", email))?;

    let token = AuthApi::new(&ctx.client).login(&email, &password).await?;
    ctx.session
        .save(&SessionData::new(token.access_token, Some(email.clone())))
        .context("Failed to store session")?;

    ctx.config.last_email = Some(email.clone());
    if let Err(e) = ctx.config.save() {
        warn!(error = %e, "Failed to save config");
    }

    info!(email = %email, "Logged in");
    println!("Logged in as {}", email);
    Ok(())
}

pub fn logout(ctx: &Context) -> Result<()> {
    let email = ctx.session.email().unwrap_or(None);
    ctx.session.clear()?;
    ctx.client.clear_cache();
    match email {
        Some(email) => println!("Logged out {}", email),
        None => println!("Logged out"),
    }
    Ok(())
}

pub async fn overview(ctx: &Context) -> Result<()> {
    let token = ctx.token()?;
    let overview = DashboardApi::new(&ctx.client, &token).overview().await?;
    render_overview(&overview);
    Ok(())
}

pub async fn organizations(ctx: &Context) -> Result<()> {
    let token = ctx.token()?;
    let organizations = OrganizationsApi::new(&ctx.client, &token)
        .list(DEFAULT_LIST_LIMIT)
        .await?;
    if organizations.is_empty() {
        println!("No organizations");
        return Ok(());
    }
    println!("{:<38} {:<32} {}", "ID", "NAME", "CNPJ");
    for org in organizations {
        println!("{:<38} {:<32} {}", org.id, org.name, org.cnpj);
    }
    Ok(())
}

pub async fn watch(ctx: &Context, org_id: Option<String>, interval: Option<Duration>) -> Result<()> {
    let token = ctx.token()?;
    let options = PollingOptions {
        interval: interval.unwrap_or_else(|| ctx.config.poll_interval()),
        ..PollingOptions::default()
    };

    let client = ctx.client.clone();
    match org_id {
        Some(org_id) => {
            let resource = AsyncResource::new(org_id, move |org_id: String, cancel| {
                let client = client.clone();
                let token = token.clone();
                async move {
                    DashboardApi::new(&client, &token)
                        .with_cancel(cancel)
                        .organization(&org_id)
                        .await
                }
            });
            watch_resource(ctx, resource, options, render_organization).await
        }
        None => {
            let resource = AsyncResource::new((), move |(), cancel| {
                let client = client.clone();
                let token = token.clone();
                async move {
                    DashboardApi::new(&client, &token)
                        .with_cancel(cancel)
                        .overview()
                        .await
                }
            });
            watch_resource(ctx, resource, options, render_overview).await
        }
    }
}

/// Render every committed state until Ctrl-C or session expiry.
async fn watch_resource<D, T>(
    ctx: &Context,
    resource: AsyncResource<D, T>,
    options: PollingOptions,
    render: fn(&T),
) -> Result<()>
where
    D: PartialEq + Clone + Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    // A terminal has no notion of being hidden
    let visibility = VisibilitySignal::default();
    let _poller =
        PollingScheduler::for_resource(resource.refetch_handle(), visibility.subscribe(), options);
    let mut states = resource.subscribe();
    let mut session_events = ctx.client.session_events().subscribe();

    println!("Refreshing every {}s. Press Ctrl-C to stop.", options.interval.as_secs());
    loop {
        tokio::select! {
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = states.borrow_and_update().clone();
                match state.phase {
                    ResourcePhase::Success => {
                        if let Some(data) = state.data.as_deref() {
                            render(data);
                        }
                    }
                    ResourcePhase::Error => {
                        if let Some(error) = state.error.as_deref() {
                            eprintln!("Error: {}", error);
                        }
                    }
                    phase => debug!(?phase, sequence = state.sequence, "Resource state changed"),
                }
            }
            event = session_events.recv() => {
                if let Ok(SessionEvent::Expired) = event {
                    eprintln!("Session expired. Run `luzia login` to sign in again.");
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    resource.dispose();
    Ok(())
}

fn render_overview(overview: &DashboardOverview) {
    println!();
    println!("Dashboard overview (updated {})", overview.last_updated);
    println!("  Organizations:              {}", overview.total_organizations);
    println!("  Sectors:                    {}", overview.total_sectors);
    println!(
        "  Users:                      {} ({} active)",
        overview.total_users, overview.active_users
    );
    println!("  Questionnaires in progress: {}", overview.questionnaires_in_progress);
    println!("  Completion rate:            {:.1}%", overview.completion_rate);
    for alert in overview.high_severity_alerts() {
        println!("  ! {}", alert.message);
    }
}

fn render_organization(detail: &OrganizationDetail) {
    println!();
    println!("{} ({})", detail.name, detail.cnpj);
    for sector in &detail.sectors {
        println!(
            "  {:<30} {:>4} users, {:>4} active",
            sector.name, sector.total_users, sector.active_users
        );
    }
    let mut statuses: Vec<_> = detail.users_by_status.iter().collect();
    statuses.sort();
    for (status, count) in statuses {
        println!("  {}: {}", status, count);
    }
    for questionnaire in &detail.questionnaires {
        println!(
            "  {} v{}: {:.1}% complete",
            questionnaire.name, questionnaire.version, questionnaire.completion_rate
        );
    }
}
