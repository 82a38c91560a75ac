use crate::error::Result;
use crate::schema::{CommissionSummary, WeeklyCommissionResult};
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportScheme {
    Cev,
    Vw,
    Weekly,
    Manager,
}

impl ExportScheme {
    pub fn summary_header(&self) -> [&'static str; 4] {
        match self {
            ExportScheme::Vw => ["Vendedor", "Total Ventas VW", "Comisión", "Período"],
            ExportScheme::Cev | ExportScheme::Weekly | ExportScheme::Manager => {
                ["Vendedor", "Total Ventas", "Comisión", "Período"]
            }
        }
    }
}

const WEEKLY_HEADER: [&str; 4] = ["Vendedor", "Semana", "Total Ventas", "Comisión"];

fn money(value: f64) -> String {
    format!("{:.2}", value)
}

pub fn write_commission_summary<W: Write>(
    w: W,
    summary: &CommissionSummary,
    scheme: ExportScheme,
) -> Result<()> {
    let mut wrt = WriterBuilder::new().from_writer(w);
    wrt.write_record(scheme.summary_header())?;
    for result in &summary.results {
        wrt.write_record([
            result.payee.as_str(),
            &money(result.total_sales),
            &money(result.commission),
            result.period.as_str(),
        ])?;
    }
    wrt.flush()?;
    Ok(())
}

pub fn write_weekly_results<W: Write>(w: W, results: &[WeeklyCommissionResult]) -> Result<()> {
    let mut wrt = WriterBuilder::new().from_writer(w);
    wrt.write_record(WEEKLY_HEADER)?;
    for result in results {
        wrt.write_record([
            result.salesperson.clone(),
            result.week.to_string(),
            money(result.total_sales),
            money(result.bonus),
        ])?;
    }
    wrt.flush()?;
    Ok(())
}

pub fn export_commission_summary(
    summary: &CommissionSummary,
    scheme: ExportScheme,
) -> Result<String> {
    let mut out = Vec::new();
    write_commission_summary(&mut out, summary, scheme)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

pub fn export_weekly_results(results: &[WeeklyCommissionResult]) -> Result<String> {
    let mut out = Vec::new();
    write_weekly_results(&mut out, results)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CommissionResult;

    fn summary() -> CommissionSummary {
        CommissionSummary {
            total_sales: 4500.5,
            total_commissions: 225.025,
            rate: Some(5.0),
            results: vec![CommissionResult {
                payee: "01/03/2024".to_string(),
                total_sales: 4500.5,
                commission: 225.025,
                period: "01/03/2024".to_string(),
            }],
        }
    }

    #[test]
    fn test_summary_export_format() {
        let csv = export_commission_summary(&summary(), ExportScheme::Cev).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Vendedor,Total Ventas,Comisión,Período");
        assert_eq!(lines[1], "01/03/2024,4500.50,225.03,01/03/2024");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_vw_header() {
        let csv = export_commission_summary(&summary(), ExportScheme::Vw).unwrap();
        assert!(csv.starts_with("Vendedor,Total Ventas VW,Comisión,Período"));
    }

    #[test]
    fn test_weekly_export_quotes_commas() {
        let results = vec![WeeklyCommissionResult {
            salesperson: "Pérez, Juan".to_string(),
            week: 3,
            year: 2024,
            total_sales: 1200.0,
            bonus: 15.0,
            period: "Semana 3".to_string(),
        }];
        let csv = export_weekly_results(&results).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Vendedor,Semana,Total Ventas,Comisión");
        assert_eq!(lines[1], "\"Pérez, Juan\",3,1200.00,15.00");
    }
}
