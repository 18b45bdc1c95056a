use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Arg, ArgMatches, Command};
use log::debug;

use chickmate::auth::validation::validate_sign_up;
use chickmate::auth::{
    FileSessionStore, GateDecision, LoginCredentials, ProfilePicture, Role, SessionGate,
    SignUpForm,
};
use chickmate::batch::{age_in_days_from_date, EntryLedger, MortalityInput};
use chickmate::Chickmate;

fn cli() -> Command<'static> {
    Command::new("chickmate")
        .version(env!("CARGO_PKG_VERSION"))
        .about("ChickMate farm dashboard from the terminal")
        .subcommand_required(true)
        .subcommand(
            Command::new("login")
                .about("Sign in and store the session")
                .arg(Arg::new("email").long("email").takes_value(true).required(true))
                .arg(
                    Arg::new("password")
                        .long("password")
                        .takes_value(true)
                        .required(true),
                ),
        )
        .subcommand(Command::new("logout").about("Clear the stored session"))
        .subcommand(Command::new("whoami").about("Show the signed-in user"))
        .subcommand(Command::new("health").about("Ping the backend"))
        .subcommand(Command::new("batches").about("List batches"))
        .subcommand(
            Command::new("batch")
                .about("Show one batch")
                .arg(Arg::new("id").required(true)),
        )
        .subcommand(
            Command::new("mortality")
                .about("Record dead birds for a batch")
                .arg(Arg::new("batch").required(true))
                .arg(Arg::new("count").required(true))
                .arg(Arg::new("cause").long("cause").takes_value(true)),
        )
        .subcommand(
            Command::new("validate-signup")
                .about("Check a registration form without sending it")
                .arg(Arg::new("username").long("username").takes_value(true))
                .arg(Arg::new("first-name").long("first-name").takes_value(true))
                .arg(Arg::new("last-name").long("last-name").takes_value(true))
                .arg(Arg::new("suffix").long("suffix").takes_value(true))
                .arg(Arg::new("email").long("email").takes_value(true))
                .arg(Arg::new("phone").long("phone").takes_value(true))
                .arg(Arg::new("password").long("password").takes_value(true))
                .arg(Arg::new("role").long("role").takes_value(true))
                .arg(
                    Arg::new("profile-pic")
                        .long("profile-pic")
                        .value_name("FILE")
                        .takes_value(true),
                ),
        )
}

fn value(matches: &ArgMatches, name: &str) -> String {
    matches.value_of(name).unwrap_or_default().to_string()
}

fn sign_up_form(matches: &ArgMatches) -> anyhow::Result<SignUpForm> {
    let role = match matches.value_of("role") {
        Some(raw) => Some(raw.parse::<Role>()?),
        None => None,
    };
    let profile_pic = match matches.value_of("profile-pic") {
        Some(path) => {
            let bytes = std::fs::read(path).with_context(|| format!("reading {}", path))?;
            let file_name = std::path::Path::new(path)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.to_string());
            Some(ProfilePicture::new(file_name, bytes))
        }
        None => None,
    };

    Ok(SignUpForm {
        username: value(matches, "username"),
        first_name: value(matches, "first-name"),
        last_name: value(matches, "last-name"),
        suffix: value(matches, "suffix"),
        email: value(matches, "email"),
        phone_number: value(matches, "phone"),
        password: value(matches, "password"),
        role,
        profile_pic,
    })
}

async fn run(
    client: &Chickmate,
    store: &FileSessionStore,
    matches: &ArgMatches,
) -> anyhow::Result<()> {
    match matches.subcommand() {
        Some(("login", sub)) => {
            let credentials = LoginCredentials::new(value(sub, "email"), value(sub, "password"));
            let session = client.auth().sign_in(store, &credentials).await?;
            println!("Signed in as {} ({})", session.username, session.role);
            return Ok(());
        }
        Some(("validate-signup", sub)) => {
            let errors = validate_sign_up(&sign_up_form(sub)?);
            if errors.is_empty() {
                println!("Form is valid");
                return Ok(());
            }
            for (field, message) in errors.iter() {
                println!("{}: {}", field, message);
            }
            bail!("{} field(s) need attention", errors.len());
        }
        Some(("health", _)) => {
            let body = client.health().await?;
            println!("{} is up {}", client.url, body);
            return Ok(());
        }
        _ => {}
    }

    if let GateDecision::Redirect(route) = SessionGate::check(store)? {
        bail!("Not signed in, go to {} first", route.path());
    }

    match matches.subcommand() {
        Some(("logout", _)) => {
            let route = client.auth().sign_out(store)?;
            println!("Signed out, back to {}", route.path());
        }
        Some(("whoami", _)) => {
            let session = client.auth().require_session(store)?;
            println!("{} <{}> role={}", session.username, session.email, session.role);
            if let Some(pic) = session.profile_pic {
                println!("profile picture: {}", pic);
            }
        }
        Some(("batches", _)) => {
            let now = Utc::now();
            for batch in client.batches().list_batches().await? {
                println!(
                    "{}\t{}\tday {}\t{} birds",
                    batch.id,
                    batch.name,
                    age_in_days_from_date(batch.start_date, now),
                    batch.population
                );
            }
        }
        Some(("batch", sub)) => {
            let batch = client.batches().get_batch(&value(sub, "id")).await?;
            let mortality_ids = client.batches().mortality_ids(&batch.id).await?;
            println!("{} ({})", batch.name, batch.id);
            println!("started {}", batch.start_date);
            println!("age {} days", age_in_days_from_date(batch.start_date, Utc::now()));
            println!("population {}", batch.population);
            println!("{} mortality records", mortality_ids.len());
        }
        Some(("mortality", sub)) => {
            let count: u32 = value(sub, "count")
                .parse()
                .context("count must be a whole number")?;
            let input = MortalityInput {
                batch_id: value(sub, "batch"),
                count,
                cause: sub.value_of("cause").map(str::to_string),
            };
            let mut ledger = EntryLedger::new();
            let entry = ledger.record_mortality(client.batches(), input).await?;
            println!(
                "Recorded {} for {} (id {})",
                entry.count,
                entry.batch_id,
                entry.backend_mortality_id.as_deref().unwrap_or(&entry.id)
            );
        }
        Some((other, _)) => bail!("unknown command {}", other),
        None => bail!("no command given"),
    }

    Ok(())
}

async fn start(matches: &ArgMatches) -> anyhow::Result<()> {
    let client = Chickmate::from_env()?;
    let store = client.session_store();
    debug!("Session file {}", store.path().display());
    run(&client, &store, matches).await
}

fn user_message(err: &anyhow::Error) -> String {
    if let Some(err) = err.downcast_ref::<chickmate::error::Error>() {
        return err.user_message();
    }
    if let Some(err) = err.downcast_ref::<chickmate::auth::AuthError>() {
        return err.user_message();
    }
    if let Some(err) = err.downcast_ref::<chickmate::batch::BatchError>() {
        return err.user_message();
    }
    format!("{:#}", err)
}

#[tokio::main]
async fn main() {
    pretty_env_logger::init();

    let matches = cli().get_matches();

    if let Err(err) = start(&matches).await {
        eprintln!("{}", user_message(&err));
        std::process::exit(1);
    }
}
