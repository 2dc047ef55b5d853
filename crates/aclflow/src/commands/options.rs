//! Option catalog browsing.

use std::sync::Arc;

use tabled::Tabled;

use aclflow_api::{AclClient, CategoryOption};
use aclflow_core::{Direction, FormSession, OptionCatalog, PairedEndpoint, RowField};

use crate::cli::{GlobalOpts, OptionsArgs};
use crate::error::CliError;
use crate::output;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct SystemTypeRow {
    #[tabled(rename = "System Type")]
    name: String,
    #[tabled(rename = "Categories")]
    categories: usize,
    #[tabled(rename = "Known Sources")]
    sources: usize,
    #[tabled(rename = "Known Destinations")]
    destinations: usize,
}

#[derive(Tabled)]
struct CategoryRow {
    #[tabled(rename = "Category")]
    value: String,
    #[tabled(rename = "Display")]
    display: String,
}

impl From<&CategoryOption> for CategoryRow {
    fn from(c: &CategoryOption) -> Self {
        Self {
            value: c.value.clone(),
            display: c.display.clone(),
        }
    }
}

#[derive(serde::Serialize)]
struct EndpointEntry {
    direction: Direction,
    #[serde(flatten)]
    endpoint: PairedEndpoint,
}

#[derive(Tabled)]
struct EndpointRow {
    #[tabled(rename = "Side")]
    side: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "IP")]
    value: String,
    #[tabled(rename = "Host")]
    host: String,
    #[tabled(rename = "Paired With")]
    paired: String,
    #[tabled(rename = "Service")]
    service: String,
}

impl From<&EndpointEntry> for EndpointRow {
    fn from(e: &EndpointEntry) -> Self {
        let ep = &e.endpoint.endpoint;
        Self {
            side: e.direction.to_string(),
            id: ep.id.to_string(),
            value: ep.value.clone(),
            host: ep.host.clone(),
            paired: e.endpoint.paired_label(e.direction),
            service: ep.service.clone(),
        }
    }
}

fn system_type_rows(catalog: &OptionCatalog) -> Vec<SystemTypeRow> {
    let count = |eps: &[aclflow_api::EndpointOption], st: &str| {
        eps.iter().filter(|e| e.system_type == st).count()
    };
    catalog
        .system_types
        .iter()
        .map(|st| SystemTypeRow {
            name: st.clone(),
            categories: catalog.categories_for(st).len(),
            sources: count(&catalog.source_endpoints, st),
            destinations: count(&catalog.destination_endpoints, st),
        })
        .collect()
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    client: &Arc<AclClient>,
    args: OptionsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let session = FormSession::open(Arc::clone(client), args.sync).await?;
    let catalog = session.catalog();
    if args.sync && !global.quiet {
        eprintln!(
            "✓ Catalog synced (last sync: {})",
            catalog.last_sync.as_deref().unwrap_or("unknown")
        );
    }

    let out = match (args.system_type, args.category) {
        (Some(system_type), Some(category)) => {
            session.update_field(0, RowField::SystemType, &system_type).await?;
            session.update_field(0, RowField::Category, &category).await?;
            let form = session.snapshot().await;
            let mut entries: Vec<EndpointEntry> = form
                .filtered_source_endpoints(&catalog, 0)?
                .into_iter()
                .map(|endpoint| EndpointEntry {
                    direction: Direction::Source,
                    endpoint,
                })
                .collect();
            entries.extend(
                form.filtered_destination_endpoints(&catalog, 0)?
                    .into_iter()
                    .map(|endpoint| EndpointEntry {
                        direction: Direction::Destination,
                        endpoint,
                    }),
            );
            output::render_list(&global.output, &entries, |e| EndpointRow::from(e), |e| {
                e.endpoint.endpoint.value.clone()
            })
        }
        (Some(system_type), None) => {
            session.update_field(0, RowField::SystemType, &system_type).await?;
            let categories = session.snapshot().await.filtered_categories(&catalog, 0)?;
            output::render_list(&global.output, &categories, |c| CategoryRow::from(c), |c| {
                c.value.clone()
            })
        }
        _ => {
            let rows = system_type_rows(&catalog);
            output::render_single(
                &global.output,
                catalog.as_ref(),
                |_| {
                    let table = tabled::Table::new(&rows)
                        .with(tabled::settings::Style::rounded())
                        .to_string();
                    format!("{table}\n{} known services", catalog.services.len())
                },
                |c| c.system_types.join("\n"),
            )
        }
    };

    session.close().await;
    output::print_output(&out, global.quiet);
    Ok(())
}
