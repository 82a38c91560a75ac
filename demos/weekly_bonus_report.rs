use sales_commission_engine::{
    available_weeks, export_weekly_results, parse_sales_text, CommissionEngine, ManagerFilters,
    WeeklyFilters,
};
use std::error::Error;

const UPLOAD: &str = "fec_emis\tnombre_vendedor\tnombre_sucursal\tnombre_cliente\tmarcas_de_vehiculos\ttotal_usd
2024-03-04\tAna Rodríguez\tSucursal Centro\tTaller Sur\tToyota\t450.00
2024-03-05\tAna Rodríguez\tSucursal Centro\tAutoPartes Express\tVolkswagen\t320.00
2024-03-06\tAna Rodríguez\tSucursal Centro\tTaller Sur\tFord\t280.00
2024-03-11\tAna Rodríguez\tSucursal Centro\tTaller Sur\tToyota\t190.00
2024-03-05\tJuan Pérez\tSucursal Norte\tRepuestos Norte SA\tVW Amarok\t4100.00
2024-03-12\tJuan Pérez\tSucursal Norte\tRepuestos Norte SA\tHonda\t820.00
2024-03-13\tJuan Pérez\tSucursal Norte\tRepuestos Norte SA\tHonda\t610.00";

fn main() -> Result<(), Box<dyn Error>> {
    println!("📊 Weekly Bonus Report Demo\n");
    println!("Weeks with fewer than 3 sale days are folded into the salesperson's weakest week");
    println!("before the tier table is applied.\n");

    let records = parse_sales_text(UPLOAD)?;
    println!("✅ Parsed {} records across weeks {:?}\n", records.len(), available_weeks(&records));

    let engine = CommissionEngine::default();
    let weekly = engine.weekly(&records, &WeeklyFilters::default());

    println!("🗓️  Fused weeks:");
    for week in &weekly.weekly_results {
        println!(
            "  {:<16} {:<10} ${:>10.2}  bonus ${:>6.2}",
            week.salesperson, week.period, week.total_sales, week.bonus
        );
    }

    println!("\n👤 Per salesperson:");
    for row in &weekly.summary.results {
        println!(
            "  {:<16} ${:>10.2}  bonuses ${:>6.2}",
            row.payee, row.total_sales, row.commission
        );
    }

    let cev = engine.cev(&records, &engine.cev_filters());
    let vw = engine.vw(&records, &engine.vw_filters());
    let manager = engine.manager(&records, &ManagerFilters::default());

    println!("\n💰 Scheme totals:");
    println!("  CEV:     ${:>8.2}", cev.total_commissions);
    println!("  VW:      ${:>8.2}", vw.total_commissions);
    println!("  Weekly:  ${:>8.2}", weekly.summary.total_commissions);
    println!("  Manager: ${:>8.2}", manager.total_commissions);

    println!("\n📄 Weekly export:\n");
    print!("{}", export_weekly_results(&weekly.weekly_results)?);

    Ok(())
}
