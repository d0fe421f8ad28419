use std::{
    io::{self, Read},
    path::Path,
    process,
    sync::Arc,
};

use kaizen::{
    application::{
        api::{ApiResponse, ContentApi, EntityApi},
        error::{AppError, error_chain},
    },
    config::{self, Command, EntityArg},
    infra::{self, telemetry},
    store::{LocalCollection, LocalStore},
};
use serde::Serialize;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(error.exit_code());
    }
}

fn report_application_error(error: &AppError) {
    let chain = error_chain(error);
    if dispatcher::has_been_set() {
        error!(error = %error, chain = ?chain, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, chain = ?chain, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    telemetry::init(&settings.logging)?;

    let local = if settings.local.seed_demo_content {
        LocalStore::with_demo_content()
    } else {
        LocalStore::new()
    };
    let remote = infra::connect(settings.backend.as_ref()).await?;
    let api = ContentApi::new(remote, Arc::new(local));

    match cli_args.command {
        Command::List(args) => run_list(&api, args.entity, args.degraded).await,
        Command::Published => print(&api.blog_posts().published().await?),
        Command::Post { id } => print(&api.blog_posts().published_post(&id).await?),
        Command::CourseVideos { course_id } => {
            print(&api.course_videos().by_course(&course_id).await?)
        }
        Command::ActiveForms => print(&api.booking_forms().active().await?),
        Command::Totals => print(&ApiResponse::ok(api.totals().await?)),
        Command::Create(args) => {
            let input = read_input(&args.file).await?;
            match args.entity {
                EntityArg::BlogPosts => create(api.blog_posts(), &input).await,
                EntityArg::Courses => create(api.courses(), &input).await,
                EntityArg::CourseVideos => create(api.course_videos(), &input).await,
                EntityArg::Videos => create(api.videos(), &input).await,
                EntityArg::BookingForms => create(api.booking_forms(), &input).await,
            }
        }
        Command::Update(args) => {
            let input = read_input(&args.file).await?;
            match args.entity {
                EntityArg::BlogPosts => update(api.blog_posts(), &args.id, &input).await,
                EntityArg::Courses => update(api.courses(), &args.id, &input).await,
                EntityArg::CourseVideos => update(api.course_videos(), &args.id, &input).await,
                EntityArg::Videos => update(api.videos(), &args.id, &input).await,
                EntityArg::BookingForms => update(api.booking_forms(), &args.id, &input).await,
            }
        }
        Command::Delete(args) => {
            let response = match args.entity {
                EntityArg::BlogPosts => api.blog_posts().delete(&args.id).await?,
                EntityArg::Courses => api.courses().delete(&args.id).await?,
                EntityArg::CourseVideos => api.course_videos().delete(&args.id).await?,
                EntityArg::Videos => api.videos().delete(&args.id).await?,
                EntityArg::BookingForms => api.booking_forms().delete(&args.id).await?,
            };
            info!(entity = ?args.entity, id = %args.id, success = response.success, "delete finished");
            print(&response)
        }
        Command::SetActive(args) => {
            print(&api.booking_forms().set_active(&args.id, args.active).await?)
        }
        Command::Session => print(&ApiResponse::found(api.session().await?)),
    }
}

async fn run_list(api: &ContentApi, entity: EntityArg, degraded: bool) -> Result<(), AppError> {
    match entity {
        EntityArg::BlogPosts => list(api.blog_posts(), degraded).await,
        EntityArg::Courses => list(api.courses(), degraded).await,
        EntityArg::CourseVideos => list(api.course_videos(), degraded).await,
        EntityArg::Videos => list(api.videos(), degraded).await,
        EntityArg::BookingForms => list(api.booking_forms(), degraded).await,
    }
}

async fn list<E: LocalCollection>(api: &EntityApi<E>, degraded: bool) -> Result<(), AppError> {
    let response = if degraded {
        api.all_or_local().await?
    } else {
        api.all().await?
    };
    print(&response)
}

async fn create<E: LocalCollection>(api: &EntityApi<E>, input: &str) -> Result<(), AppError> {
    let draft: E::Draft = serde_json::from_str(input)
        .map_err(|err| AppError::unexpected(format!("invalid draft JSON: {err}")))?;
    print(&api.create(draft).await?)
}

async fn update<E: LocalCollection>(
    api: &EntityApi<E>,
    id: &str,
    input: &str,
) -> Result<(), AppError> {
    let patch: E::Patch = serde_json::from_str(input)
        .map_err(|err| AppError::unexpected(format!("invalid patch JSON: {err}")))?;
    print(&api.update(id, patch).await?)
}

/// `-` reads standard input.
async fn read_input(path: &Path) -> Result<String, AppError> {
    if path == Path::new("-") {
        let mut input = String::new();
        io::stdin()
            .read_to_string(&mut input)
            .map_err(|err| AppError::unexpected(format!("failed to read stdin: {err}")))?;
        return Ok(input);
    }

    tokio::fs::read_to_string(path).await.map_err(|err| {
        AppError::unexpected(format!("failed to read `{}`: {err}", path.display()))
    })
}

fn print<T: Serialize>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::unexpected(format!("failed to render output: {err}")))?;
    println!("{rendered}");
    Ok(())
}
