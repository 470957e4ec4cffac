//! Command views. Each view drives a state container or an API call through
//! the [`AppContext`] and prints the result.

pub mod certification;
pub mod keys;
pub mod render;
pub mod session;
pub mod stats;
pub mod tokens;

use signatrust_core::models::KeyAction;

use crate::Result;
use crate::cli::{CertCommand, Commands, CooperatorCommand, KeyCommand, StatsCommand, TokenCommand};
use crate::context::AppContext;

pub fn version() {
    println!(
        "signatrust {} (core {})",
        env!("CARGO_PKG_VERSION"),
        signatrust_core::version()
    );
}

pub async fn dispatch(ctx: &mut AppContext, command: Commands) -> Result<()> {
    match command {
        Commands::Version => {
            version();
            Ok(())
        }
        Commands::Login(args) => session::login(ctx, args).await,
        Commands::Logout => session::logout(ctx).await,
        Commands::Whoami {
            cookie,
            permissions,
        } => session::whoami(ctx, cookie, permissions).await,
        Commands::Open { path } => session::open(ctx, &path).await,
        Commands::Keys(cmd) => keys_command(ctx, cmd).await,
        Commands::Tokens(cmd) => match cmd {
            TokenCommand::List => tokens::list(ctx).await,
            TokenCommand::Create { description } => tokens::create(ctx, &description).await,
            TokenCommand::Delete { id } => tokens::delete(ctx, id).await,
        },
        Commands::Cert(cmd) => match cmd {
            CertCommand::Search(p) => certification::search(ctx, p.params.into()).await,
            CertCommand::Export { params, out } => {
                certification::export(ctx, params.params.into(), &out).await
            }
            CertCommand::Edit(p) => certification::edit(ctx, p.params.into()).await,
            CertCommand::UploadInfo(p) => certification::upload_info(ctx, p.params.into()).await,
            CertCommand::Delete(p) => certification::delete(ctx, p.params.into()).await,
        },
        Commands::Cooperator(cmd) => match cmd {
            CooperatorCommand::List(p) => certification::cooperators(ctx, p.params.into()).await,
            CooperatorCommand::Categories(p) => {
                certification::categories(ctx, p.params.into()).await
            }
            CooperatorCommand::Types => certification::cert_types(ctx).await,
            CooperatorCommand::Save { file } => certification::save_cooperator(ctx, &file).await,
            CooperatorCommand::Delete(p) => {
                certification::delete_cooperator(ctx, p.params.into()).await
            }
            CooperatorCommand::Detail(p) => {
                certification::cooperator_detail(ctx, p.params.into()).await
            }
            CooperatorCommand::UploadLogo { file, mime } => {
                certification::upload_logo(ctx, &file, mime).await
            }
        },
        Commands::Stats(cmd) => match cmd {
            StatsCommand::Types => stats::types(ctx).await,
            StatsCommand::Growth { hours, count_way } => stats::growth(ctx, hours, count_way).await,
        },
    }
}

async fn keys_command(ctx: &mut AppContext, cmd: KeyCommand) -> Result<()> {
    match cmd {
        KeyCommand::List {
            visibility,
            page,
            page_size,
            search,
            select,
        } => {
            let filter = keys::ListFilter {
                page,
                page_size,
                search: search.unwrap_or_default(),
                select,
            };
            keys::list(ctx, visibility, filter).await
        }
        KeyCommand::Show { id } => keys::show(ctx, id).await,
        KeyCommand::Create {
            name,
            description,
            visibility,
            key_type,
            attributes,
            parent_id,
            expire_days,
        } => {
            let draft = keys::KeyDraft {
                name,
                description,
                visibility,
                key_type,
                attributes,
            };
            keys::create(ctx, draft.into_create(parent_id, expire_days)?).await
        }
        KeyCommand::Import {
            name,
            description,
            visibility,
            key_type,
            attributes,
            private_key,
            public_key,
            certificate,
        } => {
            let draft = keys::KeyDraft {
                name,
                description,
                visibility,
                key_type,
                attributes,
            };
            let files = keys::KeyFiles {
                private_key,
                public_key,
                certificate,
            };
            keys::import(ctx, draft.into_import(&files)?).await
        }
        KeyCommand::Enable { id } => keys::action(ctx, id, KeyAction::Enable).await,
        KeyCommand::Disable { id } => keys::action(ctx, id, KeyAction::Disable).await,
        KeyCommand::RequestDelete { id } => keys::action(ctx, id, KeyAction::RequestDelete).await,
        KeyCommand::CancelDelete { id } => keys::action(ctx, id, KeyAction::CancelDelete).await,
        KeyCommand::Export { id, out } => keys::export(ctx, id, out.as_deref()).await,
        KeyCommand::CheckName { name, visibility } => keys::check_name(ctx, &name, visibility).await,
    }
}
