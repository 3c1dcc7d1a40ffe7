use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use dotenvy::dotenv;
use tracing::{debug, error, info};

use waifugen::api::reference::load_reference_image;
use waifugen::api::ApiClient;
use waifugen::app::view::normalize_history_item;
use waifugen::app::{Session, SessionError};
use waifugen::catalog::{Catalog, CatalogCategory};
use waifugen::config::CONFIG;
use waifugen::prompt::form::{Form, FormField};
use waifugen::prompt::{EngineConfig, PromptEngine};
use waifugen::utils::logging::init_logging;

fn usage() -> &'static str {
    "Usage:\n  waifugen assemble [--form <file.json>] [--<field> <value>]...\n  waifugen catalog <category>\n  waifugen check-catalog\n  waifugen init\n  waifugen generate [--form <file.json>] [--<field> <value>]... [--ref-image <path>] [--api-key <key>] [--no-remember-key]\n\nFields: style, aspect-ratio, shot, body, cup, clothing, accessory, action, scene, effect, custom-text, weapon, pose"
}

#[derive(Debug, Default)]
struct FormArgs {
    form_file: Option<PathBuf>,
    overrides: Form,
    ref_image: Option<PathBuf>,
    api_key: Option<String>,
    remember_key: Option<bool>,
}

fn parse_form_args(args: &[String], allow_generate_flags: bool) -> anyhow::Result<FormArgs> {
    let mut parsed = FormArgs::default();

    let mut index = 0;
    while index < args.len() {
        let flag = args[index].as_str();
        match flag {
            "--help" | "-h" => return Err(anyhow!(usage())),
            "--form" => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| anyhow!("Missing value for --form"))?;
                parsed.form_file = Some(PathBuf::from(value));
            }
            "--ref-image" if allow_generate_flags => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| anyhow!("Missing value for --ref-image"))?;
                parsed.ref_image = Some(PathBuf::from(value));
            }
            "--api-key" if allow_generate_flags => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| anyhow!("Missing value for --api-key"))?;
                parsed.api_key = Some(value.clone());
            }
            "--no-remember-key" if allow_generate_flags => {
                parsed.remember_key = Some(false);
            }
            other => {
                let field = other
                    .strip_prefix("--")
                    .and_then(|name| name.parse::<FormField>().ok())
                    .ok_or_else(|| anyhow!("Unknown argument: {other}\n{}", usage()))?;
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| anyhow!("Missing value for --{}", field.flag()))?;
                parsed.overrides.set(field, value.clone());
            }
        }
        index += 1;
    }

    Ok(parsed)
}

async fn resolve_form(args: &FormArgs) -> anyhow::Result<Form> {
    let mut form = Form::initial();
    if let Some(path) = &args.form_file {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read form file {}", path.display()))?;
        let from_file = Form::from_json(&raw)
            .with_context(|| format!("Invalid form file {}", path.display()))?;
        form.apply_patch(&from_file);
    }
    form.apply_patch(&args.overrides);
    Ok(form)
}

fn load_catalog() -> anyhow::Result<Catalog> {
    let catalog = match &CONFIG.catalog_path {
        Some(path) => Catalog::load(path)?,
        None => Catalog::builtin()?,
    };
    debug!("Catalog ready with {} entries", catalog.total_entries());
    Ok(catalog)
}

fn build_engine() -> anyhow::Result<PromptEngine> {
    Ok(PromptEngine::new(
        EngineConfig::default().with_budget(CONFIG.prompt_budget),
    )?)
}

async fn run_assemble(args: &[String]) -> anyhow::Result<()> {
    let form_args = parse_form_args(args, false)?;
    let form = resolve_form(&form_args).await?;
    let catalog = load_catalog()?;
    let engine = build_engine()?;

    println!("{}", engine.assemble(&form, &catalog));
    Ok(())
}

fn run_catalog(args: &[String]) -> anyhow::Result<()> {
    let name = args
        .first()
        .ok_or_else(|| anyhow!("Missing catalog category\n{}", usage()))?;
    let category = name.parse::<CatalogCategory>().map_err(|err| anyhow!(err))?;
    let catalog = load_catalog()?;

    for (key, label) in catalog.labels(category) {
        if key == label {
            println!("{key}");
        } else {
            println!("{key}\t{label}");
        }
    }
    Ok(())
}

fn run_check_catalog() -> anyhow::Result<()> {
    let catalog = load_catalog()?;
    let report = catalog.integrity_report();
    for (category, count) in &report.counts {
        println!("{category}: {count}");
    }
    if !report.is_healthy() {
        let empty = report
            .empty
            .iter()
            .map(|category| category.name())
            .collect::<Vec<_>>()
            .join(", ");
        return Err(anyhow!("Catalog has empty categories: {empty}"));
    }
    info!("Catalog integrity check passed ({} entries)", catalog.total_entries());
    Ok(())
}

fn new_session(api_key: Option<String>, remember_key: bool) -> anyhow::Result<Session> {
    let client = ApiClient::from_config()?;
    let catalog = Arc::new(load_catalog()?);
    let mut session =
        Session::new(client, build_engine()?, catalog).with_api_key(api_key, remember_key);
    session.store_mut().subscribe(|state, action| {
        debug!(
            action = action.kind(),
            loading = state.loading,
            error = state.error.as_str(),
            "Store updated"
        );
    });
    Ok(session)
}

async fn run_init() -> anyhow::Result<()> {
    let mut session = new_session(CONFIG.api_key.clone(), CONFIG.remember_key)?;
    if let Err(err) = session.init().await {
        eprintln!("{}", session.view_model().error_msg);
        return Err(err.into());
    }

    let view = session.view_model();
    println!(
        "history: {} records, saved key: {}",
        view.history.len(),
        if session.has_saved_key() { "yes" } else { "no" }
    );
    for item in &view.history {
        println!("{}\t{}", item.filename, item.url);
    }
    Ok(())
}

async fn run_generate(args: &[String]) -> anyhow::Result<()> {
    let form_args = parse_form_args(args, true)?;
    let form = resolve_form(&form_args).await?;
    let ref_image = match &form_args.ref_image {
        Some(path) => Some(
            load_reference_image(path)
                .await
                .with_context(|| format!("Failed to read reference image {}", path.display()))?,
        ),
        None => None,
    };

    let api_key = form_args.api_key.clone().or_else(|| CONFIG.api_key.clone());
    let remember_key = form_args.remember_key.unwrap_or(CONFIG.remember_key);
    let mut session = new_session(api_key, remember_key)?;

    if let Err(err) = session.init().await {
        eprintln!("{}", session.view_model().error_msg);
        return Err(err.into());
    }
    session.update_form(form);

    match session.generate(ref_image).await {
        Ok(record) => {
            let item = normalize_history_item(&record);
            println!("{}\t{}", item.filename, item.url);
            Ok(())
        }
        Err(SessionError::Refused(refusal)) => Err(anyhow!(refusal)),
        Err(err) => {
            eprintln!("{}", session.view_model().error_msg);
            Err(err.into())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let _guards = init_logging();

    let args: Vec<String> = std::env::args().collect();
    let rest = args.get(2..).unwrap_or(&[]);
    let result = match args.get(1).map(String::as_str) {
        Some("assemble") => run_assemble(rest).await,
        Some("catalog") => run_catalog(rest),
        Some("check-catalog") => run_check_catalog(),
        Some("init") => run_init().await,
        Some("generate") => run_generate(rest).await,
        Some("--help") | Some("-h") | None => {
            println!("{}", usage());
            Ok(())
        }
        Some(other) => Err(anyhow!("Unknown command: {other}\n{}", usage())),
    };

    if let Err(err) = &result {
        error!("Command failed: {err:#}");
    }
    result
}
