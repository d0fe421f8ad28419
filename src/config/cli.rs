use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint, builder::BoolishValueParser};

use crate::domain::entities::EntityKind;

/// Command-line arguments for the kaizen binary.
#[derive(Debug, Parser)]
#[command(
    name = "kaizen",
    version,
    about = "Inspect and edit learning content in the configured backend or the local demo store"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "KAIZEN_CONFIG_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath,
        global = true
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args, Default, Clone)]
pub struct Overrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Override the backend URL (http(s) REST endpoint or postgres:// DSN).
    #[arg(long = "backend-url", value_name = "URL", global = true)]
    pub backend_url: Option<String>,

    /// Override the backend API key.
    #[arg(long = "backend-api-key", value_name = "KEY", global = true)]
    pub backend_api_key: Option<String>,

    /// Ignore any configured backend and use the local store.
    #[arg(long = "local-only", global = true)]
    pub local_only: bool,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// List every record of a collection.
    List(ListArgs),
    /// List published blog posts, newest first.
    Published,
    /// Show one published blog post.
    Post {
        /// Blog post id.
        id: String,
    },
    /// List the videos of a course in lesson order.
    #[command(name = "course-videos")]
    CourseVideos {
        /// Course id.
        course_id: String,
    },
    /// List active booking forms.
    #[command(name = "active-forms")]
    ActiveForms,
    /// Count courses, videos and blog posts.
    Totals,
    /// Create a record from a JSON draft.
    Create(CreateArgs),
    /// Apply a JSON patch to a record.
    Update(UpdateArgs),
    /// Delete a record.
    Delete(DeleteArgs),
    /// Activate or deactivate a booking form.
    #[command(name = "set-active")]
    SetActive(SetActiveArgs),
    /// Show the identity behind the backend connection.
    Session,
}

#[derive(Debug, Args, Clone)]
pub struct ListArgs {
    #[arg(value_enum)]
    pub entity: EntityArg,

    /// Serve local content if the backend read fails.
    #[arg(long)]
    pub degraded: bool,
}

#[derive(Debug, Args, Clone)]
pub struct CreateArgs {
    #[arg(value_enum)]
    pub entity: EntityArg,

    /// JSON file with the draft; `-` reads standard input.
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub file: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct UpdateArgs {
    #[arg(value_enum)]
    pub entity: EntityArg,

    pub id: String,

    /// JSON file with the patch; `-` reads standard input.
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub file: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct DeleteArgs {
    #[arg(value_enum)]
    pub entity: EntityArg,

    pub id: String,
}

#[derive(Debug, Args, Clone)]
pub struct SetActiveArgs {
    /// Booking form id.
    pub id: String,

    #[arg(action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EntityArg {
    #[value(name = "blog-posts")]
    BlogPosts,
    Courses,
    #[value(name = "course-videos")]
    CourseVideos,
    Videos,
    #[value(name = "booking-forms")]
    BookingForms,
}

impl From<EntityArg> for EntityKind {
    fn from(value: EntityArg) -> Self {
        match value {
            EntityArg::BlogPosts => EntityKind::BlogPost,
            EntityArg::Courses => EntityKind::Course,
            EntityArg::CourseVideos => EntityKind::CourseVideo,
            EntityArg::Videos => EntityKind::Video,
            EntityArg::BookingForms => EntityKind::BookingForm,
        }
    }
}
