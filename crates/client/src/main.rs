//! courier CLI entry point.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use courier_client::bloc::{
    AuthEvent, AuthHandler, CounterEvent, CounterHandler, ProfileEvent, ProfileHandler,
    UploadEvent, UploadHandler,
};
use courier_client::cli::counter::CounterAction;
use courier_client::cli::files::UploadKind;
use courier_client::cli::profile::ProfileAction;
use courier_client::cli::users::UsersAction;
use courier_client::cli::{Cli, Commands, OutputFormat};
use courier_client::output::{pretty, render};
use courier_client::store::FileStore;
use courier_client::{ApiClient, AuthClient, FileUploadApi, UserApi};
use courier_core::auth::RegisterRequest;
use courier_core::state::{AuthState, CounterStatus, ViewState};
use courier_core::{ApiConfig, KeyValueStore, RequestDescriptor};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Where and how results are printed.
#[derive(Debug, Clone, Copy)]
struct Printer {
    format: OutputFormat,
    quiet: bool,
}

impl Printer {
    fn print<T, F>(&self, value: &T, pretty_text: F)
    where
        T: serde::Serialize + ?Sized,
        F: FnOnce(&T) -> String,
    {
        println!("{}", render(value, self.format, pretty_text));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let Cli {
        base_url,
        store,
        format,
        quiet,
        log_json,
        command,
    } = Cli::parse();
    let out = Printer { format, quiet };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "courier_client=info,courier_core=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if log_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    let mut config = ApiConfig::from_env();
    if let Some(base_url) = base_url {
        config.base_url = base_url;
    }

    let store: Arc<dyn KeyValueStore> = Arc::new(
        FileStore::open(&store)
            .await
            .with_context(|| format!("opening store {}", store.display()))?,
    );
    let api = ApiClient::new(config)?;
    let auth = AuthClient::new(api.clone(), store.clone());

    let succeeded = match command {
        Commands::Login { email, password } => {
            run_auth(out, auth, AuthEvent::LoginRequested { email, password }).await
        }
        Commands::Register {
            name,
            email,
            password,
            phone,
        } => {
            let request = RegisterRequest {
                name,
                email,
                password,
                phone,
            };
            run_auth(out, auth, AuthEvent::RegisterRequested(request)).await
        }
        Commands::Logout => {
            auth.initialize_auth().await;
            run_auth(out, auth, AuthEvent::LogoutRequested).await
        }
        Commands::Refresh => {
            auth.initialize_auth().await;
            run_auth(out, auth, AuthEvent::RefreshRequested).await
        }
        Commands::Whoami => run_auth(out, auth, AuthEvent::AppStarted).await,
        Commands::Profile(command) => {
            auth.initialize_auth().await;
            let users = UserApi::new(api.clone());
            match command.action {
                ProfileAction::Show => run_profile(out, users, &api, ProfileEvent::Load).await,
                ProfileAction::Update {
                    name,
                    email,
                    phone,
                    avatar,
                } => {
                    let request = courier_core::auth::UpdateProfileRequest {
                        name,
                        email,
                        phone,
                        avatar,
                    };
                    run_profile(out, users, &api, ProfileEvent::Update(request)).await
                }
                ProfileAction::ChangePassword { current, new } => {
                    let response = users.change_password(&current, &new).await;
                    out.print(&response, pretty::format_envelope);
                    response.is_success()
                }
            }
        }
        Commands::Users(command) => {
            auth.initialize_auth().await;
            let users = UserApi::new(api.clone());
            match command.action {
                UsersAction::List { page, limit } => {
                    let response = users.list_users(page, limit).await;
                    match response.data() {
                        Some(list) => out.print(list.as_slice(), pretty::format_users),
                        None => eprintln!("Error: {}", response.message_or("no users returned")),
                    }
                    response.is_success()
                }
                UsersAction::Get { id } => {
                    let response = users.get_user(&id).await;
                    match response.data() {
                        Some(user) => out.print(user, pretty::format_user),
                        None => eprintln!("Error: {}", response.message_or("user not found")),
                    }
                    response.is_success()
                }
                UsersAction::Delete { id } => {
                    let response = users.delete_user(&id).await;
                    if !response.is_success() {
                        eprintln!("Error: {}", response.message_or("delete failed"));
                    } else if !out.quiet {
                        println!("Deleted user {}", id);
                    }
                    response.is_success()
                }
            }
        }
        Commands::Upload(command) => {
            auth.initialize_auth().await;
            let mut paths = command.paths;
            let event = match command.kind {
                UploadKind::Avatar | UploadKind::Document if paths.len() != 1 => {
                    bail!("{:?} uploads take exactly one file", command.kind)
                }
                UploadKind::Avatar => UploadEvent::UploadAvatar(paths.remove(0)),
                UploadKind::Document => UploadEvent::UploadDocument(paths.remove(0)),
                UploadKind::Files => UploadEvent::UploadFiles(paths),
            };
            run_transfer(out, FileUploadApi::new(api.clone()), event).await
        }
        Commands::Download(command) => {
            auth.initialize_auth().await;
            let event = UploadEvent::Download {
                url: command.url,
                destination: command.output,
            };
            run_transfer(out, FileUploadApi::new(api.clone()), event).await
        }
        Commands::Request {
            method,
            endpoint,
            data,
            query,
            auth: requires_auth,
        } => {
            if requires_auth {
                auth.initialize_auth().await;
            }
            let mut builder =
                RequestDescriptor::builder(method, endpoint).requires_auth(requires_auth);
            for (key, value) in query {
                builder = builder.query(key, value);
            }
            if let Some(data) = data {
                let body = serde_json::from_str(&data).context("--data is not valid JSON")?;
                builder = builder.json(body);
            }
            let response = api.execute(&builder.build()).await;
            out.print(&response, pretty::format_envelope);
            response.is_success()
        }
        Commands::Counter(command) => run_counter(out, store, command.action).await,
    };

    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}

async fn run_auth(out: Printer, auth: AuthClient, event: AuthEvent) -> bool {
    let bloc = AuthHandler::spawn(auth);
    let state = bloc
        .dispatch(event, AuthState::is_terminal, |state| {
            if !state.is_terminal() {
                tracing::debug!(?state, "auth state");
            }
        })
        .await;
    bloc.close().await;

    match state {
        Some(state) => {
            out.print(&state, pretty::format_auth_state);
            matches!(
                state,
                AuthState::Authenticated { .. } | AuthState::Unauthenticated
            )
        }
        None => false,
    }
}

async fn run_profile(out: Printer, users: UserApi, api: &ApiClient, event: ProfileEvent) -> bool {
    let bloc = ProfileHandler::spawn(users, api.session().clone());
    let state = bloc.dispatch(event, ViewState::is_terminal, |_| {}).await;
    bloc.close().await;
    finish_view(out, state, pretty::format_user)
}

async fn run_transfer(out: Printer, files: FileUploadApi, event: UploadEvent) -> bool {
    let bloc = UploadHandler::spawn(files);
    let mut drew_progress = false;
    let state = bloc
        .dispatch(event, ViewState::is_terminal, |state| {
            if let ViewState::Progress { ratio } = state {
                if !out.quiet {
                    eprint!("\r{}", pretty::format_progress(*ratio));
                    drew_progress = true;
                }
            }
        })
        .await;
    if drew_progress {
        eprintln!();
    }
    bloc.close().await;
    finish_view(out, state, pretty::format_transfer)
}

async fn run_counter(out: Printer, store: Arc<dyn KeyValueStore>, action: CounterAction) -> bool {
    let bloc = CounterHandler::spawn(store);
    let mut state = bloc
        .dispatch(
            CounterEvent::Load,
            |s| s.status != CounterStatus::Loading,
            |_| {},
        )
        .await;

    let event = match action {
        CounterAction::Show => None,
        CounterAction::Increment => Some(CounterEvent::Increment),
        CounterAction::Decrement => Some(CounterEvent::Decrement),
        CounterAction::Reset => Some(CounterEvent::Reset),
    };
    let loaded = matches!(&state, Some(s) if s.status == CounterStatus::Idle);
    if let (Some(event), true) = (event, loaded) {
        state = bloc.dispatch(event, |_| true, |_| {}).await;
    }
    bloc.close().await;

    match state {
        Some(state) => {
            out.print(&state, pretty::format_counter);
            !matches!(state.status, CounterStatus::Error(_))
        }
        None => false,
    }
}

fn finish_view<T: serde::Serialize>(
    out: Printer,
    state: Option<ViewState<T>>,
    format: impl Fn(&T) -> String,
) -> bool {
    match state {
        Some(state) => {
            out.print(&state, |state| pretty::format_view_state(state, format));
            matches!(state, ViewState::Success { .. })
        }
        None => false,
    }
}
