// SPDX-License-Identifier: MPL-2.0
use dashboard_i18n::config;
use dashboard_i18n::dom::Document;
use dashboard_i18n::error::Result;
use dashboard_i18n::i18n::Localizer;
use dashboard_i18n::paths;
use dashboard_i18n::scheduler::FrameQueue;
use dashboard_i18n::shell::{self, Backend, Page, Process, ProcessStatus, ShellOptions};
use dashboard_i18n::storage::{MemoryStore, PreferenceStore, TomlPreferenceStore};
use dashboard_i18n::update::{UpdateCheck, UPDATE_TEMPLATE_KEY};
use std::cell::RefCell;
use std::rc::Rc;

const HELP: &str = "\
dashboard-i18n: render the localized dashboard page

USAGE:
  dashboard-i18n [OPTIONS]

OPTIONS:
  --lang <LOCALE>        Force a locale (en, zh, zh-CN, ...)
  --config-dir <DIR>     Override the configuration directory
  --data-dir <DIR>       Override the data directory (stored preferences)
  --latest <VERSION>     Release tag to compare against the running version
  -h, --help             Print this help
";

struct Flags {
    lang: Option<String>,
    config_dir: Option<String>,
    data_dir: Option<String>,
    latest: Option<String>,
}

fn parse_flags() -> std::result::Result<Option<Flags>, pico_args::Error> {
    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        return Ok(None);
    }
    let flags = Flags {
        lang: args.opt_value_from_str("--lang")?,
        config_dir: args.opt_value_from_str("--config-dir")?,
        data_dir: args.opt_value_from_str("--data-dir")?,
        latest: args.opt_value_from_str("--latest")?,
    };
    let rest = args.finish();
    if !rest.is_empty() {
        log::warn!("ignoring unexpected arguments: {rest:?}");
    }
    Ok(Some(flags))
}

fn sample_processes() -> Vec<Process> {
    vec![
        Process {
            pid: 1,
            name: "systemd".to_string(),
            status: ProcessStatus::Sleeping,
            cpu: 0.0,
            mem: 12 * 1024 * 1024,
        },
        Process {
            pid: 412,
            name: "dietpi-dashboard".to_string(),
            status: ProcessStatus::Running,
            cpu: 2.5,
            mem: 9 * 1024 * 1024,
        },
        Process {
            pid: 977,
            name: "rsync".to_string(),
            status: ProcessStatus::Paused,
            cpu: 0.0,
            mem: 3 * 1024 * 1024,
        },
    ]
}

fn open_store() -> Rc<dyn PreferenceStore> {
    match TomlPreferenceStore::in_data_dir(None) {
        Ok(store) => Rc::new(store),
        Err(error) => {
            log::warn!("preferences will not persist: {error}");
            Rc::new(MemoryStore::new())
        }
    }
}

fn run(flags: Flags) -> Result<()> {
    paths::init_cli_overrides(flags.data_dir, flags.config_dir);
    let (config, warning) = config::load();
    if let Some(key) = warning {
        log::warn!("{key}: using default settings");
    }

    let version = env!("CARGO_PKG_VERSION");
    let document = Rc::new(RefCell::new(Document::new()));
    let (layout, table) = {
        let mut doc = document.borrow_mut();
        let layout = shell::build(
            &mut doc,
            &ShellOptions {
                version: version.to_string(),
                current_page: Page::Process,
                backends: vec![Backend {
                    addr: "127.0.0.1:5252".to_string(),
                    name: "localhost".to_string(),
                }],
                current_backend: Some("127.0.0.1:5252".to_string()),
                dietpi_update: None,
            },
        )?;
        let table = shell::process_table(&mut doc, layout.main)?;
        (layout, table)
    };

    let store = open_store();
    let frames = Rc::new(FrameQueue::new());
    let localizer = Localizer::builder(Rc::clone(&document), frames.clone())
        .store(Rc::clone(&store))
        .config(config.engine.clone())
        .build()?;

    let forced = flags.lang.or(config.general.language);
    let locale = match forced.as_deref() {
        Some(tag) => {
            let locale = localizer.set_locale(Some(tag));
            if config.engine.observe_mutations {
                localizer.watch();
            }
            locale
        }
        None => localizer.start(),
    };
    log::info!("rendering dashboard in {locale}");

    if let Some(tag) = flags.latest {
        let check = UpdateCheck::new(&*store);
        check.record_release(&tag, chrono::Utc::now())?;
        if let Some(newer) = check.available_update(version) {
            {
                let mut doc = document.borrow_mut();
                doc.set_attribute(layout.update_notice, "data-i18n-template", UPDATE_TEMPLATE_KEY);
                doc.set_attribute(layout.update_notice, "data-version", &newer);
            }
            localizer.apply_to(Some(layout.update_notice), None);
        }
    }

    let processes = sample_processes();
    {
        let mut doc = document.borrow_mut();
        for process in &processes {
            let row = shell::process_row(&mut doc, process)?;
            doc.append_child(table.table, row)?;
        }
        shell::set_count(&mut doc, table.count, processes.len());
    }
    localizer.apply_to(Some(table.count), None);
    frames.run_frame();

    let doc = document.borrow();
    println!("{}", doc.outer_html(doc.root()));
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let flags = match parse_flags() {
        Ok(Some(flags)) => flags,
        Ok(None) => {
            print!("{HELP}");
            return;
        }
        Err(error) => {
            eprintln!("{error}\n\n{HELP}");
            std::process::exit(2);
        }
    };

    if let Err(error) = run(flags) {
        log::error!("{error}");
        eprintln!("{error}");
        std::process::exit(1);
    }
}
