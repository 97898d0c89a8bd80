//! Site command handler.

use tabled::Tabled;

use gridwatch_core::Site;

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct SiteRow {
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    site_type: String,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "MW")]
    capacity: String,
    #[tabled(rename = "Inverters")]
    inverters: String,
    #[tabled(rename = "Commissioned")]
    commissioned: String,
}

impl From<&Site> for SiteRow {
    fn from(s: &Site) -> Self {
        Self {
            code: s.site_id.clone(),
            name: s.name.clone(),
            site_type: s.site_type.to_string(),
            location: s.location.clone(),
            capacity: format!("{:.1}", s.capacity_mw),
            inverters: s.inverter_count.to_string(),
            commissioned: s
                .commission_date
                .map(|d| d.to_string())
                .unwrap_or_default(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let (_, fleet) = config::resolve(global)?;
    let out = output::render_list(
        &global.output,
        &fleet,
        |s| SiteRow::from(s),
        |s| s.site_id.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
