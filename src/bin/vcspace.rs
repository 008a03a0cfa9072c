use anyhow::{Context, Result};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::env;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use vcspace::config::Config;
use vcspace::context::{AppContext, StandardContext};
use vcspace::events::ContentEventBus;
use vcspace::lifecycle::LifecycleEvent;
use vcspace::model::PluginManifest;
use vcspace::router::EditorRouter;
use vcspace::storage::SessionStorage;
use vcspace::writer::DirectSink;

fn init_logging(ctx: &dyn AppContext) {
    let Some(path) = ctx.get_log_path() else {
        return;
    };
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    let config = ConfigBuilder::new().set_time_format_rfc3339().build();
    let _ = WriteLogger::init(LevelFilter::Info, config, file);
}

/// Runs `f` inside one Created..Destroyed cycle so the session is restored
/// first and persisted afterwards, exactly as the app does.
fn with_session<F>(ctx: Arc<dyn AppContext>, f: F)
where
    F: FnOnce(&mut EditorRouter),
{
    let bus = Arc::new(ContentEventBus::new());
    let sink = Arc::new(DirectSink::new(ctx.clone()));
    let mut router = EditorRouter::new(ctx, bus, sink);
    router.on_lifecycle_event(LifecycleEvent::Create);
    f(&mut router);
    router.on_lifecycle_event(LifecycleEvent::Destroy);
}

fn absolute(path: &str) -> Result<PathBuf> {
    std::path::absolute(path).with_context(|| format!("Invalid path: {}", path))
}

fn print_session(ctx: &dyn AppContext) -> Result<()> {
    let snapshot = SessionStorage::load(ctx)?;
    if snapshot.is_empty() {
        println!("No files in the last session.");
        return Ok(());
    }
    for path in &snapshot.paths {
        let marker = if path.exists() { " " } else { "!" };
        println!("{} {}", marker, path.display());
    }
    Ok(())
}

fn print_plugins(ctx: &dyn AppContext) {
    let config = Config::load_or_default(ctx);
    let Some(root) = config.plugins_root(ctx) else {
        println!("No plugins directory.");
        return;
    };
    let plugins = PluginManifest::list_installed(&root);
    if plugins.is_empty() {
        println!("No plugins installed in {}", root.display());
        return;
    }
    for p in plugins {
        let scripts: Vec<&str> = p.scripts.iter().map(|s| s.name.as_str()).collect();
        println!(
            "{} {} ({}) [{}]",
            p.package_name,
            p.version,
            p.name,
            scripts.join(", ")
        );
    }
}

fn main() -> Result<()> {
    let mut args: Vec<String> = env::args().skip(1).collect();

    // Handle --root before anything else
    let mut root = None;
    if let Some(pos) = args.iter().position(|a| a == "--root" || a == "-r") {
        if pos + 1 >= args.len() {
            anyhow::bail!("--root requires a path");
        }
        root = Some(PathBuf::from(args.remove(pos + 1)));
        args.remove(pos);
    }

    let ctx: Arc<dyn AppContext> = Arc::new(StandardContext::new(root));
    init_logging(ctx.as_ref());

    match args.first().map(String::as_str) {
        None | Some("session") => print_session(ctx.as_ref())?,
        Some("open") => {
            let paths = args[1..]
                .iter()
                .map(|p| absolute(p))
                .collect::<Result<Vec<_>>>()?;
            with_session(ctx.clone(), |router| {
                for path in paths {
                    router.open_file(path);
                }
            });
            print_session(ctx.as_ref())?;
        }
        Some("close") => {
            let paths = args[1..]
                .iter()
                .map(|p| absolute(p))
                .collect::<Result<Vec<_>>>()?;
            with_session(ctx.clone(), |router| {
                for path in &paths {
                    router.close_file(Path::new(path));
                }
            });
            print_session(ctx.as_ref())?;
        }
        Some("clear") => {
            SessionStorage::clear(ctx.as_ref())?;
            println!("Session cleared.");
        }
        Some("plugins") => print_plugins(ctx.as_ref()),
        Some("--help" | "-h" | "help") => print_help(),
        Some(other) => {
            eprintln!("Unknown command: {}", other);
            print_help();
            std::process::exit(2);
        }
    }
    Ok(())
}

fn print_help() {
    println!(
        "vcspace v{} - Visual Code Space session tool",
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("USAGE:");
    println!("    vcspace [--root <path>] [COMMAND]");
    println!();
    println!("COMMANDS:");
    println!("    session               List files of the last editing session (default)");
    println!("    open <path>...        Add files to the saved session");
    println!("    close <path>...       Remove files from the saved session");
    println!("    clear                 Forget the saved session");
    println!("    plugins               List installed plugins");
    println!();
    println!("OPTIONS:");
    println!("    -r, --root <path>     Use a different directory for config and data.");
    println!("    -h, --help            Show this help message.");
    println!();
    println!("Entries marked '!' no longer exist and are skipped when the editor restores.");
}
