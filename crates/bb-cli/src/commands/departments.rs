//! Lists configured departments with their headcount.

use anyhow::Result;

use bb_service::BreakService;

pub fn run(service: &BreakService) -> Result<()> {
    for department in service.store().departments() {
        let headcount = service.store().users_in_department(department.id).len();
        println!(
            "{:<6} {} ({headcount} employees)",
            department.code, department.name
        );
    }
    Ok(())
}
