use std::fs;

use anyhow::Context as _;
use application::AppContext;
use catalog::{CatalogClient, CatalogWorker};
use storage::Storage;
use ui::Ui;

use directories::ProjectDirs;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let project_dirs =
        ProjectDirs::from("dev", "openshelf", "openshelf").context("resolve project dirs")?;

    let config_dir = project_dirs.config_dir();
    fs::create_dir_all(config_dir)
        .with_context(|| format!("create config dir {}", config_dir.display()))?;

    let db_path = config_dir.join("openshelf.db");
    let storage = Storage::open(&db_path)?;
    let settings = storage.load_settings()?;
    let favorites = storage.load_favorites();

    let client = CatalogClient::new()?;
    let worker = CatalogWorker::spawn(client);

    let ctx = AppContext::new(settings).with_favorites(favorites);
    let mut ui = Ui::new(ctx, storage, worker);
    ui.run()?;

    Ok(())
}
