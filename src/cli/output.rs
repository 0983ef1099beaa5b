//! Rendering of operation replies in the selected output format

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::io;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{format_date, or_dash, truncate_str};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::assets::Asset;
use crate::core::entity::{NoAttrs, Record};
use crate::core::identity::{EntityKind, RecordId};
use crate::core::resource::{ListPage, Reply};
use crate::entities::SupplierAttrs;

/// Extra list columns contributed by a kind's attributes
pub trait ListColumns {
    fn headers() -> Vec<&'static str>;

    fn cells(&self) -> Vec<String>;
}

impl ListColumns for NoAttrs {
    fn headers() -> Vec<&'static str> {
        vec![]
    }

    fn cells(&self) -> Vec<String> {
        vec![]
    }
}

impl ListColumns for SupplierAttrs {
    fn headers() -> Vec<&'static str> {
        vec!["STATUS", "CATEGORY"]
    }

    fn cells(&self) -> Vec<String> {
        vec![self.status.clone(), truncate_str(&self.category_of_supplier, 24)]
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
    Ok(())
}

fn print_yaml<T: Serialize>(value: &T) -> Result<()> {
    print!("{}", serde_yml::to_string(value).into_diagnostic()?);
    Ok(())
}

fn print_status<T>(reply: &Reply<T>, global: &GlobalOpts) {
    if global.verbose {
        eprintln!("{} {}", style("status").dim(), reply.status);
    }
}

/// Reply of create/update: the affected id
pub fn print_id_reply(reply: &Reply<RecordId>, global: &GlobalOpts) -> Result<()> {
    print_status(reply, global);
    match global.format {
        OutputFormat::Json => print_json(reply),
        OutputFormat::Yaml => print_yaml(reply),
        OutputFormat::Id => {
            println!("{}", reply.payload);
            Ok(())
        }
        _ => {
            if !global.quiet {
                println!(
                    "{} {} {}",
                    style("✓").green(),
                    reply.message,
                    style(&reply.payload).cyan()
                );
            }
            Ok(())
        }
    }
}

/// Reply of show/remove: one full record
pub fn print_record_reply<A>(kind: EntityKind, reply: &Reply<Record<A>>, global: &GlobalOpts) -> Result<()>
where
    A: Serialize + ListColumns,
{
    print_status(reply, global);
    match global.format {
        OutputFormat::Auto => {
            if !global.quiet {
                eprintln!("{} {}", style("✓").green(), reply.message);
            }
            print_yaml(&reply.payload)
        }
        OutputFormat::Yaml => print_yaml(reply),
        OutputFormat::Json => print_json(reply),
        OutputFormat::Id => {
            println!("{}", reply.payload.id);
            Ok(())
        }
        format => print_records(kind, std::slice::from_ref(&reply.payload), format),
    }
}

/// Reply of list: a page of records
pub fn print_page_reply<A>(kind: EntityKind, reply: &Reply<ListPage<A>>, global: &GlobalOpts) -> Result<()>
where
    A: Serialize + ListColumns,
{
    print_status(reply, global);
    let page = &reply.payload;
    let format = match global.format {
        OutputFormat::Auto => OutputFormat::Tsv,
        f => f,
    };

    match format {
        OutputFormat::Json => print_json(reply),
        OutputFormat::Yaml => print_yaml(reply),
        OutputFormat::Id => {
            for record in &page.results {
                println!("{}", record.id);
            }
            Ok(())
        }
        OutputFormat::Tsv | OutputFormat::Md if page.results.is_empty() => {
            if !global.quiet {
                println!("No {} records found ({} total).", kind, page.count);
            }
            Ok(())
        }
        format => {
            print_records(kind, &page.results, format)?;
            if format != OutputFormat::Csv && !global.quiet {
                println!();
                println!(
                    "{} of {} {}(s), offset {}.",
                    style(page.results.len()).cyan(),
                    style(page.count).cyan(),
                    kind,
                    page.offset
                );
            }
            Ok(())
        }
    }
}

fn record_headers<A: ListColumns>(kind: EntityKind) -> Vec<&'static str> {
    let mut headers = vec!["ID", "NAME", "SLUG"];
    if kind.parent().is_some() {
        headers.push("PARENT");
        headers.push("PARENT NAME");
    }
    headers.extend(A::headers());
    headers.push("ICON");
    headers.push("CREATED");
    headers
}

fn record_row<A: ListColumns>(kind: EntityKind, record: &Record<A>, truncate: bool) -> Vec<String> {
    let fit = |s: &str, max: usize| {
        if truncate {
            truncate_str(s, max)
        } else {
            s.to_string()
        }
    };
    let mut row = vec![
        record.id.to_string(),
        fit(&record.name, 30),
        fit(&record.slug, 30),
    ];
    if kind.parent().is_some() {
        row.push(or_dash(record.parent.map(|p| p.to_string()).as_deref()));
        row.push(match &record.parent_name {
            Some(name) => fit(name, 30),
            None => or_dash(None),
        });
    }
    row.extend(record.attrs.cells());
    row.push(if truncate {
        (if record.icon.is_some() { "yes" } else { "-" }).to_string()
    } else {
        record.icon.clone().unwrap_or_default()
    });
    row.push(if truncate {
        format_date(&record.created_at)
    } else {
        record.created_at.to_rfc3339()
    });
    row
}

fn print_records<A: ListColumns>(kind: EntityKind, records: &[Record<A>], format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Csv {
        let mut writer = csv::Writer::from_writer(io::stdout());
        let headers: Vec<String> = record_headers::<A>(kind)
            .iter()
            .map(|h| h.to_lowercase().replace(' ', "_"))
            .collect();
        writer.write_record(&headers).into_diagnostic()?;
        for record in records {
            writer
                .write_record(record_row(kind, record, false))
                .into_diagnostic()?;
        }
        writer.flush().into_diagnostic()?;
        return Ok(());
    }

    let mut builder = Builder::default();
    builder.push_record(record_headers::<A>(kind));
    for record in records {
        builder.push_record(record_row(kind, record, true));
    }
    let mut table = builder.build();
    if format == OutputFormat::Md {
        table.with(Style::markdown());
    } else {
        table.with(Style::blank());
    }
    println!("{}", table);
    Ok(())
}

/// Asset inventory
pub fn print_assets(reply: &Reply<Vec<Asset>>, global: &GlobalOpts) -> Result<()> {
    print_status(reply, global);
    let assets = &reply.payload;
    match global.format {
        OutputFormat::Json => print_json(reply),
        OutputFormat::Yaml => print_yaml(reply),
        OutputFormat::Id => {
            for asset in assets {
                println!("{}", asset.id);
            }
            Ok(())
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(io::stdout());
            writer
                .write_record(["id", "secure_url", "storage_id", "created_at"])
                .into_diagnostic()?;
            for asset in assets {
                writer
                    .write_record([
                        asset.id.to_string(),
                        asset.secure_url.clone(),
                        asset.storage_id.clone(),
                        asset.created_at.to_rfc3339(),
                    ])
                    .into_diagnostic()?;
            }
            writer.flush().into_diagnostic()?;
            Ok(())
        }
        format => {
            if assets.is_empty() {
                if !global.quiet {
                    println!("No assets recorded.");
                }
                return Ok(());
            }
            let mut builder = Builder::default();
            builder.push_record(["ID", "URL", "STORAGE ID", "CREATED"]);
            for asset in assets {
                builder.push_record([
                    asset.id.to_string(),
                    truncate_str(&asset.secure_url, 60),
                    asset.storage_id.clone(),
                    format_date(&asset.created_at),
                ]);
            }
            let mut table = builder.build();
            if format == OutputFormat::Md {
                table.with(Style::markdown());
            } else {
                table.with(Style::blank());
            }
            println!("{}", table);
            if !global.quiet {
                println!();
                println!("{}", reply.message);
            }
            Ok(())
        }
    }
}
