use std::{process, sync::Arc};

use tokio::{signal, sync::watch, try_join};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;
use yatube::{
    application::{
        authors::AuthorService,
        error::AppError,
        feed::FeedService,
        follows::FollowService,
        groups::{CreateGroupCommand, GroupService},
        posts::PostService,
        repos::{AuthorsRepo, CommentsRepo, FollowsRepo, GroupsRepo, PostsRepo, PostsWriteRepo},
    },
    cache::{CacheConfig, PageCacheState},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, AdminState, HttpState},
        telemetry,
    },
};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Authors(args) => match args.command {
            config::AuthorsCommand::Create(create) => run_create_author(settings, create).await,
        },
        config::Command::Groups(args) => match args.command {
            config::GroupsCommand::Create(create) => run_create_group(settings, create).await,
        },
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let (http_state, admin_state) = build_states(repositories, &settings);

    let public_router = http::build_router(http_state);
    let admin_router = http::build_admin_router(admin_state);

    let public_listener = bind(settings.server.public_addr).await?;
    let admin_listener = bind(settings.server.admin_addr).await?;

    info!(
        target = "yatube::serve",
        public = %settings.server.public_addr,
        admin = %settings.server.admin_addr,
        cache_enabled = settings.cache.enabled,
        "listeners bound"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(err) = signal::ctrl_c().await {
            warn!(target = "yatube::serve", error = %err, "could not listen for ctrl-c");
            return;
        }
        info!(target = "yatube::serve", "shutdown requested");
        let _ = shutdown_tx.send(true);
    });

    let public_server = axum::serve(public_listener, public_router.into_make_service())
        .with_graceful_shutdown(wait_for_shutdown(shutdown_rx.clone()));
    let admin_server = axum::serve(admin_listener, admin_router.into_make_service())
        .with_graceful_shutdown(wait_for_shutdown(shutdown_rx));

    try_join!(public_server, admin_server)
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

async fn run_create_author(
    settings: config::Settings,
    args: config::CreateAuthorArgs,
) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let authors = AuthorService::new(repositories);

    let issued = authors.register(&args.username).await?;
    // the secret is not recoverable after this point
    println!("author: {}", issued.record.username);
    println!("token:  {}", issued.token);
    Ok(())
}

async fn run_create_group(
    settings: config::Settings,
    args: config::CreateGroupArgs,
) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let groups = GroupService::new(repositories);

    let group = groups
        .create(CreateGroupCommand {
            title: args.title,
            description: args.description,
            slug: args.slug,
        })
        .await?;
    println!("group: {} (/group/{})", group.title, group.slug);
    Ok(())
}

async fn bind(addr: std::net::SocketAddr) -> Result<tokio::net::TcpListener, AppError> {
    tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| AppError::from(InfraError::Bind { addr, source }))
}

async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
    // a dropped sender also ends the wait
    let _ = rx.wait_for(|stop| *stop).await;
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))?;

    let pool =
        PostgresRepositories::connect(database_url, settings.database.max_connections.get())
            .await
            .map_err(|err| InfraError::database(err.to_string()))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| InfraError::migration(err.to_string()))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_states(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> (HttpState, AdminState) {
    let authors_repo: Arc<dyn AuthorsRepo> = repositories.clone();
    let groups_repo: Arc<dyn GroupsRepo> = repositories.clone();
    let posts_repo: Arc<dyn PostsRepo> = repositories.clone();
    let posts_write_repo: Arc<dyn PostsWriteRepo> = repositories.clone();
    let comments_repo: Arc<dyn CommentsRepo> = repositories.clone();
    let follows_repo: Arc<dyn FollowsRepo> = repositories.clone();

    let follows = FollowService::new(follows_repo);
    let feed = FeedService::new(
        posts_repo.clone(),
        groups_repo.clone(),
        authors_repo.clone(),
        comments_repo.clone(),
        follows.clone(),
        settings.feed.page_size.get(),
    );
    let posts = PostService::new(posts_repo, posts_write_repo, groups_repo, comments_repo);

    let cache = PageCacheState::new(CacheConfig::from(&settings.cache));

    let http_state = HttpState {
        feed: Arc::new(feed),
        posts: Arc::new(posts),
        follows: Arc::new(follows),
        authors: Arc::new(AuthorService::new(authors_repo)),
        cache: cache.clone(),
    };
    let admin_state = AdminState {
        db: repositories,
        cache,
    };

    (http_state, admin_state)
}
