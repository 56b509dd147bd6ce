//! Lists break types and their current capacity.

use std::fmt::Write as _;

use anyhow::Result;

use bb_service::{BreakService, BreakTypeAvailability};

pub fn run(service: &BreakService) -> Result<()> {
    print!("{}", render_availability(&service.availability()));
    Ok(())
}

pub(crate) fn render_availability(slots: &[BreakTypeAvailability]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<10} {:<20} {:>6} {:>10}  {}",
        "CODE", "NAME", "IN USE", "LIMIT", "AVAILABLE"
    );
    for slot in slots {
        let _ = writeln!(
            out,
            "{:<10} {:<20} {:>6} {:>10}  {}",
            slot.code,
            slot.name,
            slot.current_count,
            slot.limit.to_string(),
            if slot.is_available { "yes" } else { "no" }
        );
    }
    out
}
