//! Subcommand handlers.

use std::io::Write;

use anyhow::{Context, Result, bail};
use cityportal_application::{ApplicationError, SessionContext, UnauthorizedPolicy};
use cityportal_domain::{
    Activity, CityMap, CityService, CityStats, EmergencyAlert, GuardDecision, HealthcareOverview,
    MyScrapbookEntries, NewScrapbookEntry, PortalResource, PortalUsers, PublicScrapbookEntries,
    RegisterRequest, SafetyOverview, ScrapbookEntry, SessionState, TrafficReport,
};

use crate::cli::{Command, ScrapbookAction};

pub async fn run(context: &SessionContext, command: Command, out: &mut impl Write) -> Result<()> {
    let session = context.session();
    match command {
        Command::Login { username, password } => {
            let user = session
                .login(&username, &password)
                .await
                .map_err(user_facing)?;
            writeln!(out, "Signed in as {} ({})", user.name, user.role)?;
        }
        Command::Register {
            username,
            email,
            name,
            password,
            roles,
        } => {
            let mut fields = RegisterRequest::new(username, email, password, name);
            if !roles.is_empty() {
                fields = fields.with_roles(roles);
            }
            let message = session.register(&fields).await.map_err(user_facing)?;
            writeln!(
                out,
                "{}",
                message.unwrap_or_else(|| "Account created.".to_string())
            )?;
            writeln!(out, "Sign in with `cityportal login {}`.", fields.username)?;
        }
        Command::Logout => {
            session.logout().await.map_err(user_facing)?;
            writeln!(out, "Signed out")?;
        }
        Command::Whoami => match session.state() {
            SessionState::Authenticated(user) => writeln!(
                out,
                "{} <{}> id={} role={}",
                user.username, user.email, user.id, user.role
            )?,
            _ => writeln!(out, "Not signed in")?,
        },
        Command::Open { path } => {
            let Some(decision) = context.guard().check_path(&path) else {
                bail!("unknown view: {path}");
            };
            writeln!(out, "{}", describe(&path, decision))?;
        }
        Command::Get {
            path,
            tolerate_unauthorized,
        } => {
            let policy = if tolerate_unauthorized {
                UnauthorizedPolicy::Tolerate
            } else {
                UnauthorizedPolicy::Fail
            };
            let value = session.query(&path, policy).await.map_err(user_facing)?;
            let value = value.unwrap_or(serde_json::Value::Null);
            writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
        }
        Command::Stats => {
            let stats: CityStats = fetch(context).await?;
            writeln!(out, "Congestion:        {}", stats.congestion_level)?;
            writeln!(out, "Air quality:       {}", stats.air_quality)?;
            writeln!(out, "Emergency response {} min", stats.emergency_response_time)?;
            writeln!(out, "Active visitors:   {}", stats.active_visitors)?;
        }
        Command::Alerts => {
            let alerts: Vec<EmergencyAlert> = fetch(context).await?;
            for alert in alerts {
                writeln!(
                    out,
                    "[{:?}] {} ({}) {}",
                    alert.level, alert.title, alert.time, alert.description
                )?;
            }
        }
        Command::Services => {
            let services: Vec<CityService> = fetch(context).await?;
            for service in services {
                writeln!(
                    out,
                    "{:<24} {:<10} {}",
                    service.name, service.status, service.description
                )?;
            }
        }
        Command::Activities => {
            let activities: Vec<Activity> = fetch(context).await?;
            for activity in activities {
                writeln!(
                    out,
                    "{} | {} | {} | {}",
                    activity.time, activity.service, activity.status, activity.details
                )?;
            }
        }
        Command::Traffic => {
            let report: TrafficReport = fetch(context).await?;
            for (district, level) in &report.congestion {
                writeln!(out, "{district}: {level}")?;
            }
            for incident in &report.incidents {
                writeln!(
                    out,
                    "{} at {} ({}, {})",
                    incident.kind, incident.location, incident.severity, incident.status
                )?;
            }
        }
        Command::Healthcare => {
            let overview: HealthcareOverview = fetch(context).await?;
            for facility in &overview.facilities {
                writeln!(
                    out,
                    "{} [{}] wait {} {}",
                    facility.name,
                    facility.kind,
                    facility.wait_time,
                    if facility.emergency { "(ER)" } else { "" }
                )?;
            }
            let ambulances = overview.emergency_services.ambulances;
            writeln!(
                out,
                "Ambulances: {}/{} available, response {}",
                ambulances.available,
                ambulances.total,
                overview.emergency_services.response_time.current
            )?;
        }
        Command::Safety => {
            let safety: SafetyOverview = fetch(context).await?;
            for contact in &safety.emergency_contacts {
                writeln!(out, "{}: {}", contact.name, contact.phone)?;
            }
            for alert in &safety.alerts {
                writeln!(out, "[{}] {} at {}", alert.time, alert.title, alert.location)?;
            }
        }
        Command::Map => {
            let map: CityMap = fetch(context).await?;
            for point in &map.points {
                writeln!(
                    out,
                    "{:<20} {:<12} {:.4},{:.4}",
                    point.name, point.category, point.location.lat, point.location.lng
                )?;
            }
        }
        Command::Users => {
            let users: PortalUsers = fetch(context).await?;
            for user in &users.0 {
                writeln!(out, "{:>5} {:<16} {}", user.id, user.username, user.name)?;
            }
        }
        Command::Scrapbook { action } => scrapbook(context, action, out).await?,
    }
    Ok(())
}

async fn scrapbook(
    context: &SessionContext,
    action: ScrapbookAction,
    out: &mut impl Write,
) -> Result<()> {
    let session = context.session();
    match action {
        ScrapbookAction::List { public } => {
            let entries = if public {
                fetch::<PublicScrapbookEntries>(context).await?.0
            } else {
                fetch::<MyScrapbookEntries>(context).await?.0
            };
            for entry in &entries {
                writeln!(out, "{}", describe_entry(entry))?;
            }
        }
        ScrapbookAction::Add {
            title,
            content,
            location,
            image_url,
            public,
        } => {
            let entry = NewScrapbookEntry {
                location,
                image_url,
                is_public: public,
                ..NewScrapbookEntry::new(title, content)
            };
            let message = session
                .create_scrapbook_entry(&entry)
                .await
                .map_err(user_facing)?;
            writeln!(out, "{}", message.as_deref().unwrap_or("Memory saved."))?;
        }
        ScrapbookAction::Delete { id } => {
            let message = session
                .delete_scrapbook_entry(id)
                .await
                .map_err(user_facing)?;
            writeln!(out, "{}", message.as_deref().unwrap_or("Memory deleted."))?;
        }
    }
    Ok(())
}

async fn fetch<R: PortalResource>(context: &SessionContext) -> Result<R> {
    context
        .session()
        .fetch_resource::<R>(UnauthorizedPolicy::Fail)
        .await
        .map_err(user_facing)?
        .with_context(|| format!("{} returned no data", R::PATH))
}

fn user_facing(err: ApplicationError) -> anyhow::Error {
    anyhow::anyhow!(err.user_message())
}

fn describe(path: &str, decision: GuardDecision) -> String {
    match decision {
        GuardDecision::Loading => format!("{path}: loading"),
        GuardDecision::Redirect { to } => format!("{path}: sign in required, redirect to {to}"),
        GuardDecision::AccessDenied { required } => {
            format!("{path}: access denied, requires the {required} role")
        }
        GuardDecision::Render => format!("{path}: allowed"),
    }
}

fn describe_entry(entry: &ScrapbookEntry) -> String {
    let mut line = format!("#{} {}", entry.id, entry.title);
    if let Some(location) = &entry.location {
        line.push_str(&format!(" @ {location}"));
    }
    if let Some(user) = &entry.user {
        line.push_str(&format!(" by {}", user.name));
    }
    if entry.is_public {
        line.push_str(" (public)");
    }
    line
}
