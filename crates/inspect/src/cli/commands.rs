use super::render::{
    print_config, print_dashboard, print_messages, print_ncr_defaults, print_record,
    print_records,
};
use super::setup::{into_fields, Cli, Commands, FilterArgs, NcrCommand};
use anyhow::{Context, Result};
use clap::Parser;
use inspectapp::api::InspectApi;
use inspectapp::commands::export::{ExportSelection, Tabular};
use inspectapp::commands::list::RecordFilter;
use inspectapp::commands::{CmdResult, Fields};
use inspectapp::error::InspectError;
use inspectapp::init::{initialize, InspectContext};
use inspectapp::model::{
    CivilInspection, DailyReport, GeodeticInspection, Kind, NcrReport, Record, RemarkReport,
};
use inspectapp::store::attachments::{FsAttachments, IncomingFile};
use inspectapp::store::fs_backend::FsBackend;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Api = InspectApi<FsBackend, FsAttachments>;

/// Exit code for a refused lifecycle transition (e.g. closing without a scan).
pub const EXIT_PRECONDITION: i32 = 2;

// Binds `$t` to the record type of `$kind` and evaluates `$body`.
macro_rules! with_kind {
    ($kind:expr, $t:ident => $body:expr) => {
        match $kind {
            Kind::Geodetic => {
                type $t = GeodeticInspection;
                $body
            }
            Kind::Civil => {
                type $t = CivilInspection;
                $body
            }
            Kind::Ncr => {
                type $t = NcrReport;
                $body
            }
            Kind::Remark => {
                type $t = RemarkReport;
                $body
            }
            Kind::Daily => {
                type $t = DailyReport;
                $body
            }
        }
    };
}

// Like `with_kind!`, for operations NCRs handle through their own lifecycle.
macro_rules! with_plain_kind {
    ($kind:expr, $t:ident => $body:expr, ncr => $ncr:expr) => {
        match $kind {
            Kind::Geodetic => {
                type $t = GeodeticInspection;
                $body
            }
            Kind::Civil => {
                type $t = CivilInspection;
                $body
            }
            Kind::Remark => {
                type $t = RemarkReport;
                $body
            }
            Kind::Daily => {
                type $t = DailyReport;
                $body
            }
            Kind::Ncr => $ncr,
        }
    };
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    if cli.verbose {
        init_logging();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let ctx = initialize(&cwd, cli.data.clone())?;
    let actor = cli
        .actor
        .clone()
        .unwrap_or_else(|| ctx.config.inspector_name.clone());
    tracing::debug!(
        data_dir = %ctx.api.paths().data_dir.display(),
        actor = %actor,
        command = ?cli.command,
        "running"
    );

    match cli.command {
        None | Some(Commands::Dashboard) => {
            print_dashboard(&ctx.api.dashboard());
            Ok(())
        }
        Some(Commands::List { kind, filter }) => {
            with_kind!(kind, T => handle_list::<T>(&ctx.api, filter))
        }
        Some(Commands::Show { kind, id }) => with_kind!(kind, T => handle_show::<T>(&ctx.api, id)),
        Some(Commands::New { kind, fields }) => {
            let fields = into_fields(fields);
            with_plain_kind!(kind, T => {
                let result = ctx.api.create::<T>(&fields, &actor)?;
                report(&result);
                Ok(())
            }, ncr => handle_ncr_new(&ctx.api, &fields, &[], &actor))
        }
        Some(Commands::Edit {
            kind,
            id,
            fields,
            replace,
        }) => {
            let fields = into_fields(fields);
            with_plain_kind!(kind, T => {
                let result = if replace {
                    ctx.api.replace::<T>(id, &fields)?
                } else {
                    ctx.api.merge::<T>(id, &fields)?
                };
                report(&result);
                Ok(())
            }, ncr => {
                if replace {
                    anyhow::bail!("NCRs cannot be replaced wholesale; edit individual fields");
                }
                report(&ctx.api.ncr_update(id, &fields, None, &actor)?);
                Ok(())
            })
        }
        Some(Commands::Delete { kind, id }) => {
            with_plain_kind!(kind, T => {
                report(&ctx.api.delete::<T>(id)?);
                Ok(())
            }, ncr => {
                report(&ctx.api.ncr_delete(id)?);
                Ok(())
            })
        }
        Some(Commands::Export { kind, id, filter }) => {
            let selection = match id {
                Some(id) => ExportSelection::Single(id),
                None => ExportSelection::Filtered(RecordFilter::from(filter)),
            };
            with_kind!(kind, T => handle_export::<T>(&ctx.api, &selection))
        }
        Some(Commands::Ncr(command)) => handle_ncr(&ctx, command, &actor),
        Some(Commands::Config) => {
            print_config(&ctx.config, ctx.api.paths());
            Ok(())
        }
    }
}

/// Process exit code for an error returned by [`run`].
pub fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<InspectError>() {
        Some(e) if e.is_precondition() => EXIT_PRECONDITION,
        _ => 1,
    }
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inspect=debug,inspectapp=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn report<T>(result: &CmdResult<T>) {
    print_messages(&result.messages);
}

fn handle_list<T: Tabular>(api: &Api, filter: FilterArgs) -> Result<()> {
    let result = api.list::<T>(&RecordFilter::from(filter))?;
    print_records(&result.records);
    print_messages(&result.messages);
    Ok(())
}

fn handle_show<T: Record>(api: &Api, id: u64) -> Result<()> {
    let result = api.show::<T>(id)?;
    for record in &result.records {
        print_record(record);
    }
    Ok(())
}

fn handle_export<T: Tabular>(api: &Api, selection: &ExportSelection) -> Result<()> {
    report(&api.export::<T>(selection)?);
    Ok(())
}

fn read_photos(paths: &[PathBuf]) -> Result<Vec<IncomingFile>> {
    paths
        .iter()
        .map(|path| {
            let bytes =
                fs::read(path).with_context(|| format!("Cannot read {}", path.display()))?;
            Ok(IncomingFile::new(file_name(path), bytes))
        })
        .collect()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn handle_ncr_new(api: &Api, fields: &Fields, photos: &[IncomingFile], actor: &str) -> Result<()> {
    let result = api.ncr_create(fields, photos, actor)?;
    if let Some(ncr) = result.records.first() {
        print_records(std::slice::from_ref(ncr));
    }
    report(&result);
    Ok(())
}

fn handle_ncr(ctx: &InspectContext, command: NcrCommand, actor: &str) -> Result<()> {
    let api = &ctx.api;
    match command {
        NcrCommand::NextNumber => println!("{}", api.ncr_next_number()),
        NcrCommand::Defaults => print_ncr_defaults(&api.ncr_defaults()),
        NcrCommand::New { fields, photos } => {
            let photos = read_photos(&photos)?;
            handle_ncr_new(api, &into_fields(fields), &photos, actor)?;
        }
        NcrCommand::Edit { id, fields, scan } => {
            report(&api.ncr_update(id, &into_fields(fields), scan.as_deref(), actor)?);
        }
        NcrCommand::Close { id } => report(&api.ncr_close(id, actor)?),
        NcrCommand::Unsign { id } => report(&api.ncr_remove_signed_scan(id)?),
        NcrCommand::AddPhoto { id, files } => {
            let photos = read_photos(&files)?;
            let result = api.ncr_add_photos(id, &photos)?;
            report(&result);
            for ncr in &result.records {
                for photo in &ncr.photos {
                    println!("  {}", photo);
                }
            }
        }
        NcrCommand::RemovePhoto { id, name } => report(&api.ncr_remove_photo(id, &name)?),
    }
    Ok(())
}
