use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{anyhow, Context, Result};

use crate::cli::{
    CliCommand, ConvertArgs, ExampleArgs, ListArgs, ShowArgs, StatusArgs, SubmitArgs,
};
use crate::codec;
use crate::config::AppConfig;
use crate::form::FormController;
use crate::model::{ConfigFormat, Task};
use crate::services::TasksService;

pub fn execute<W: Write>(config: &AppConfig, command: CliCommand, mut writer: W) -> Result<()> {
    let mut service = TasksService::in_memory(config.clone());
    match command {
        CliCommand::List(args) => handle_list(&service, &args, &mut writer),
        CliCommand::Show(args) => handle_show(&service, &args, &mut writer),
        CliCommand::Submit(args) => handle_submit(&mut service, &args, &mut writer),
        CliCommand::Status(args) => handle_status(&mut service, &args, &mut writer),
        CliCommand::Convert(args) => handle_convert(&args, &mut writer),
        CliCommand::Example(args) => handle_example(config, &args, &mut writer),
        CliCommand::Tui => Err(anyhow!("launch interactive surfaces directly")),
    }
}

fn handle_list<W: Write>(service: &TasksService, args: &ListArgs, mut writer: W) -> Result<()> {
    let tasks = service.list();
    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&tasks)?)?;
        return Ok(());
    }

    if tasks.is_empty() {
        writeln!(writer, "No tasks submitted yet")?;
        return Ok(());
    }
    for task in &tasks {
        writeln!(writer, "{}", TaskLine(task))?;
    }
    Ok(())
}

fn handle_show<W: Write>(service: &TasksService, args: &ShowArgs, mut writer: W) -> Result<()> {
    let task = match service.fetch_task(&args.id) {
        Ok(task) => task,
        Err(not_found) => {
            writeln!(writer, "{}", not_found)?;
            return Ok(());
        }
    };
    let format = resolve_format(service.config(), args.format);

    writeln!(writer, "{}", TaskLine(&task))?;
    writeln!(
        writer,
        "submitted by {} <{}> at {}",
        task.submitter.name,
        task.submitter.avatar_url,
        task.created_at.to_rfc3339()
    )?;
    writeln!(writer, "updated at {}", task.updated_at.to_rfc3339())?;
    writeln!(writer)?;
    writeln!(writer, "{}", service.render_config(&task, format).trim_end())?;
    Ok(())
}

fn handle_submit<W: Write>(
    service: &mut TasksService,
    args: &SubmitArgs,
    mut writer: W,
) -> Result<()> {
    let mut form = service.new_form();
    fill_form(&mut form, args)?;
    let task = service.submit(&mut form)?;
    writeln!(writer, "{}", serde_json::to_string_pretty(&task)?)?;
    Ok(())
}

fn fill_form(form: &mut FormController, args: &SubmitArgs) -> Result<()> {
    form.set_name(args.name.clone());
    if let Some(algorithm) = &args.algorithm {
        form.set_algorithm(algorithm.clone());
    }
    if let Some(environment) = &args.environment {
        form.set_environment(environment.clone());
    }
    if let Some(rate) = args.learning_rate {
        form.set_learning_rate(rate)?;
    }
    if let Some(batch) = args.batch_size {
        form.set_batch_size(batch);
    }
    if let Some(episodes) = args.episodes {
        form.set_episodes(episodes);
    }

    if let Some(path) = &args.config_file {
        let text = read_input(Some(path))?;
        form.toggle_mode();
        if let Some(format) = args.format {
            if format != form.format() {
                // the buffer still holds the snapshot, which always parses
                form.toggle_format()?;
            }
        }
        form.set_raw_text(text);
    }
    Ok(())
}

fn handle_status<W: Write>(
    service: &mut TasksService,
    args: &StatusArgs,
    mut writer: W,
) -> Result<()> {
    match service.update_status(&args.id, args.status) {
        Ok(task) => writeln!(writer, "{}", serde_json::to_string_pretty(&task)?)?,
        Err(not_found) => writeln!(writer, "{}", not_found)?,
    }
    Ok(())
}

fn handle_convert<W: Write>(args: &ConvertArgs, mut writer: W) -> Result<()> {
    let text = read_input(args.input.as_deref())?;
    let converted = codec::convert(&text, args.from, args.to)?;
    writeln!(writer, "{}", converted.trim_end())?;
    Ok(())
}

fn handle_example<W: Write>(config: &AppConfig, args: &ExampleArgs, mut writer: W) -> Result<()> {
    let format = resolve_format(config, args.format);
    let text = codec::serialize(&codec::example_config(), format);
    writeln!(writer, "{}", text.trim_end())?;
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        _ => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}

struct TaskLine<'a>(&'a Task);

impl std::fmt::Display for TaskLine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let task = self.0;
        write!(
            f,
            "{:<26}  {:<9}  {}  [{} on {}]  by {}  {}",
            task.id,
            task.status.as_str(),
            task.name,
            task.algorithm,
            task.environment,
            task.submitter.name,
            task.created_at.format("%Y-%m-%d %H:%M")
        )
    }
}

fn resolve_format(config: &AppConfig, requested: Option<ConfigFormat>) -> ConfigFormat {
    requested.unwrap_or_else(|| config.default_format())
}
