use chrono::NaiveDate;
use sales_commission_engine::*;
use std::fs;
use std::path::PathBuf;

const HEADER: &str =
    "fec_emis\tnombre_vendedor\tnombre_sucursal\tnombre_cliente\tmarcas_de_vehiculos\ttotal_usd";

struct Sale<'a> {
    date: &'a str,
    salesperson: &'a str,
    client: &'a str,
    brand: &'a str,
    total: f64,
}

fn sale<'a>(date: &'a str, salesperson: &'a str, client: &'a str, brand: &'a str, total: f64) -> Sale<'a> {
    Sale {
        date,
        salesperson,
        client,
        brand,
        total,
    }
}

fn upload_rows(sales: &[Sale]) -> anyhow::Result<Vec<SalesRecord>> {
    let text = sales.iter().fold(String::from(HEADER), |mut acc, s| {
        acc.push_str(&format!(
            "\n{}\t{}\tSucursal Centro\t{}\t{}\t{}",
            s.date, s.salesperson, s.client, s.brand, s.total
        ));
        acc
    });
    Ok(parse_sales_text(&text)?)
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("{}-{}", std::process::id(), name))
}

fn export_to_file(contents: &str, name: &str) -> anyhow::Result<PathBuf> {
    let path = temp_path(name);
    fs::write(&path, contents)?;
    Ok(path)
}

#[test]
fn test_sample_upload_analytics() -> anyhow::Result<()> {
    let records = parse_sales_text(&generate_sample_csv())?;
    assert_eq!(records.len(), 6);

    let reference = NaiveDate::from_ymd_opt(2024, 1, 20).unwrap();
    let analytics = calculate_analytics_at(&records, &SalesFilters::default(), reference);

    let grand_total: f64 = records.iter().map(|r| r.total_usd()).sum();
    assert!((analytics.total_today - 348.00).abs() < 1e-9);
    assert!((analytics.total_this_week - grand_total).abs() < 1e-9);
    assert!((analytics.total_this_month - grand_total).abs() < 1e-9);

    let branches: Vec<&str> = analytics
        .totals_by_branch
        .iter()
        .map(|t| t.key.as_str())
        .collect();
    assert_eq!(branches, vec!["Sucursal Centro", "Sucursal Norte", "Sucursal Sur"]);
    assert_eq!(analytics.top_branch.name, "Sucursal Norte");
    assert!((analytics.top_branch.total - 608.71).abs() < 1e-9);

    assert_eq!(analytics.totals_by_day.len(), 6);
    assert_eq!(analytics.totals_by_day[0].key, "15/01/2024");
    assert_eq!(analytics.totals_by_month.len(), 1);
    assert_eq!(analytics.totals_by_month[0].key, "Enero");
    assert_eq!(analytics.totals_by_brand.len(), 6);

    assert_eq!(
        unique_values(&records, Dimension::Salesperson),
        vec!["Ana Rodríguez", "Carlos López", "Juan Pérez", "María García"]
    );
    assert_eq!(available_weeks(&records), vec![3]);

    let north_only = SalesFilters {
        branch: Some("Sucursal Norte".to_string()),
        ..Default::default()
    };
    let filtered = calculate_analytics_at(&records, &north_only, reference);
    assert_eq!(filtered.totals_by_salesperson.len(), 2);
    assert_eq!(filtered.top_salesperson.name, "Ana Rodríguez");

    Ok(())
}

#[test]
fn test_cev_threshold_and_exclusions() -> anyhow::Result<()> {
    let records = upload_rows(&[
        sale("2024-03-04", "Ana", "Taller Sur", "Toyota", 3000.0),
        sale("2024-03-04", "Luis", "Taller Sur", "Ford", 1000.01),
        sale("2024-03-04", "Luis", "MERCADO LIBRE VE", "Ford", 500.0),
        sale("2024-03-05", "Ana", "Taller Sur", "Toyota", 4000.0),
        sale("2024-03-05", "Moto Siete Caracas", "Taller Sur", "Honda", 600.0),
    ])?;

    let engine = CommissionEngine::default();
    let summary = engine.cev(&records, &engine.cev_filters());
    assert_eq!(summary.rate, Some(5.0));
    assert_eq!(summary.results.len(), 2);

    let first = &summary.results[0];
    assert_eq!(first.payee, "04/03/2024");
    assert_eq!(first.period, "04/03/2024");
    assert!((first.total_sales - 4000.01).abs() < 1e-9);
    assert!((first.commission - 200.0005).abs() < 1e-9);

    // exactly at the threshold earns nothing
    assert_eq!(summary.results[1].total_sales, 4000.0);
    assert_eq!(summary.results[1].commission, 0.0);

    let inclusive = CevFilters {
        exclude_mercado_libre: false,
        exclude_moto_siete: false,
        ..engine.cev_filters()
    };
    let summary = calculate_cev_commissions(&records, &inclusive);
    assert!((summary.results[0].commission - 225.0005).abs() < 1e-9);
    assert!((summary.results[1].commission - 230.0).abs() < 1e-9);
    assert!((summary.total_commissions - 455.0005).abs() < 1e-9);

    let csv = export_commission_summary(&summary, ExportScheme::Cev)?;
    let path = export_to_file(&csv, "cev_commissions.csv")?;
    let written = fs::read_to_string(&path)?;
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines[0], "Vendedor,Total Ventas,Comisión,Período");
    assert_eq!(lines[1], "04/03/2024,4500.01,225.00,04/03/2024");
    assert_eq!(lines[2], "05/03/2024,4600.00,230.00,05/03/2024");
    fs::remove_file(path)?;

    Ok(())
}

#[test]
fn test_vw_brand_and_salesperson_filters() -> anyhow::Result<()> {
    let records = upload_rows(&[
        sale("2024-03-04", "Ana", "Cliente", "Volkswagen", 1000.0),
        sale("2024-03-04", "Luis", "Cliente", "VW Amarok", 500.0),
        sale("2024-03-04", "Ana", "Cliente", "Toyota", 9000.0),
        sale("2024-03-06", "Luis", "Cliente", "volkswagen", 250.0),
    ])?;

    let summary = calculate_vw_commissions(
        &records,
        &VwFilters {
            start_date: None,
            end_date: None,
            rate: 2.0,
            salespeople: Vec::new(),
        },
    );
    assert_eq!(summary.results.len(), 2);
    assert!((summary.results[0].total_sales - 1500.0).abs() < 1e-9);
    assert!((summary.results[0].commission - 30.0).abs() < 1e-9);
    assert!((summary.results[1].commission - 5.0).abs() < 1e-9);

    let engine = CommissionEngine::default();
    let only_ana = VwFilters {
        salespeople: vec!["Ana".to_string()],
        ..engine.vw_filters()
    };
    let summary = engine.vw(&records, &only_ana);
    assert_eq!(summary.results.len(), 1);
    assert!((summary.total_sales - 1000.0).abs() < 1e-9);

    let csv = export_commission_summary(&summary, ExportScheme::Vw)?;
    assert!(csv.starts_with("Vendedor,Total Ventas VW,Comisión,Período"));

    Ok(())
}

#[test]
fn test_weekly_bonus_fuses_sparse_week() -> anyhow::Result<()> {
    // week 10 of 2024 runs Sunday 3 March to Saturday 9 March
    let records = upload_rows(&[
        sale("2024-03-04", "Ana", "Cliente", "Toyota", 400.0),
        sale("2024-03-05", "Ana", "Cliente", "Toyota", 300.0),
        sale("2024-03-06", "Ana", "Cliente", "Toyota", 300.0),
        sale("2024-03-11", "Ana", "Cliente", "Toyota", 200.0),
        sale("2024-03-12", "Luis", "Cliente", "Ford", 300.0),
        sale("2024-03-13", "Luis", "Cliente", "Ford", 300.0),
    ])?;
    assert_eq!(available_weeks(&records), vec![10, 11]);

    let report = calculate_weekly_commissions(&records, &WeeklyFilters::default());

    assert_eq!(report.weekly_results.len(), 2);
    let ana = &report.weekly_results[0];
    assert_eq!(ana.salesperson, "Ana");
    assert_eq!(ana.week, 10);
    assert_eq!(ana.year, 2024);
    assert!((ana.total_sales - 1200.0).abs() < 1e-9);
    assert_eq!(ana.bonus, 15.0);
    assert_eq!(ana.period, "Semana 10");

    // sparse with nothing to merge into: stands alone
    let luis = &report.weekly_results[1];
    assert_eq!(luis.week, 11);
    assert_eq!(luis.bonus, 10.0);

    assert_eq!(report.summary.rate, None);
    assert_eq!(report.summary.total_commissions, 25.0);
    assert!((report.summary.total_sales - 1800.0).abs() < 1e-9);
    assert_eq!(report.summary.results[0].payee, "Ana");
    assert_eq!(report.summary.results[0].period, " - ");

    let bounded = WeeklyFilters {
        start_date: NaiveDate::from_ymd_opt(2024, 3, 10),
        end_date: NaiveDate::from_ymd_opt(2024, 3, 16),
        ..Default::default()
    };
    let report = calculate_weekly_commissions(&records, &bounded);
    assert_eq!(report.summary.results[0].period, "2024-03-10 - 2024-03-16");
    // Ana's 200 alone is under every band
    assert_eq!(report.weekly_results[0].bonus, 0.0);

    let full = calculate_weekly_commissions(&records, &WeeklyFilters::default());
    let csv = export_weekly_results(&full.weekly_results)?;
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "Vendedor,Semana,Total Ventas,Comisión");
    assert_eq!(lines[1], "Ana,10,1200.00,15.00");
    assert_eq!(lines[2], "Luis,11,600.00,10.00");

    Ok(())
}

#[test]
fn test_manager_bonus_steps() -> anyhow::Result<()> {
    let records = upload_rows(&[
        sale("2024-03-04", "Ana", "Cliente", "Toyota", 2999.99),
        sale("2024-03-05", "Ana", "Cliente", "Toyota", 3000.0),
        sale("2024-03-06", "Ana", "Cliente", "Toyota", 4999.99),
        sale("2024-03-07", "Ana", "Cliente", "Toyota", 2500.0),
        sale("2024-03-07", "Luis", "Cliente", "Ford", 2500.0),
    ])?;

    let summary = calculate_manager_commissions(&records, &ManagerFilters::default());
    let bonuses: Vec<f64> = summary.results.iter().map(|r| r.commission).collect();
    assert_eq!(bonuses, vec![0.0, 15.0, 20.0, 30.0]);
    assert_eq!(summary.total_commissions, 65.0);
    assert_eq!(summary.rate, None);

    let march_fifth = ManagerFilters {
        start_date: NaiveDate::from_ymd_opt(2024, 3, 5),
        end_date: NaiveDate::from_ymd_opt(2024, 3, 5),
    };
    let summary = calculate_manager_commissions(&records, &march_fifth);
    assert_eq!(summary.results.len(), 1);
    assert_eq!(summary.total_commissions, 15.0);

    Ok(())
}

#[test]
fn test_config_from_json_drives_engine() -> anyhow::Result<()> {
    let config = CommissionConfig::from_json_str(
        r#"{ "cev_rate": 10.0, "cev_daily_threshold": 100.0, "min_active_days": 1 }"#,
    )?;
    assert_eq!(config.vw_rate, 2.0);
    assert_eq!(config.weekly_tiers.len(), 19);

    let records = upload_rows(&[
        sale("2024-03-04", "Ana", "Cliente", "Toyota", 600.0),
        sale("2024-03-11", "Ana", "Cliente", "Toyota", 700.0),
    ])?;

    let engine = CommissionEngine::new(config);
    let cev = engine.cev(&records, &engine.cev_filters());
    assert!((cev.total_commissions - 130.0).abs() < 1e-9);

    // one active day is enough, so nothing is fused
    let weekly = engine.weekly(&records, &WeeklyFilters::default());
    assert_eq!(weekly.weekly_results.len(), 2);
    assert_eq!(weekly.summary.total_commissions, 20.0);

    let overlapping = r#"{ "weekly_tiers": [
        { "min": 0.0, "max": 1000.0, "bonus": 5.0 },
        { "min": 900.0, "max": 2000.0, "bonus": 10.0 }
    ] }"#;
    assert!(matches!(
        CommissionConfig::from_json_str(overlapping),
        Err(SalesError::InvalidTierTable(_))
    ));

    let schema = CommissionConfig::schema_as_json()?;
    assert!(schema.contains("weekly_tiers"));
    assert!(schema.contains("manager_rule"));

    let path = temp_path("commission_config.json");
    fs::write(&path, serde_json::to_string_pretty(&CommissionConfig::default())?)?;
    assert_eq!(CommissionConfig::from_json_file(&path)?, CommissionConfig::default());
    fs::remove_file(path)?;

    Ok(())
}

#[test]
fn test_json_store_feeds_reports() -> anyhow::Result<()> {
    let path = temp_path("sales_records.json");
    let store = JsonFileRecordStore::new(&path);
    let config = CommissionConfig::default();

    let report = SalesProcessor::process_into_store(&generate_sample_csv(), &config, &store)?;
    assert_eq!(report.record_count, 6);

    let extra = upload_rows(&[sale("2024-02-01", "Luis", "Cliente", "VW Gol", 100.0)])?;
    store.insert(&extra)?;

    let records = store.fetch_all()?;
    assert_eq!(records.len(), 7);
    assert_eq!(records[0].row().issue_date, "2024-02-01");
    assert_eq!(records[0].calendar().month, "Febrero");
    assert_eq!(records[0].calendar().weekday, "Jueves");

    let raw = fs::read_to_string(&path)?;
    assert!(raw.contains("\"nombre_vendedor\""));
    assert!(raw.contains("\"fec_emis\""));

    let vw = calculate_vw_commissions(&records, &CommissionEngine::default().vw_filters());
    assert!((vw.total_commissions - 2.0).abs() < 1e-9);

    store.delete_all()?;
    assert!(store.fetch_all()?.is_empty());
    fs::remove_file(path)?;

    Ok(())
}

#[test]
fn test_upload_rejections() {
    let missing = "fec_emis\tnombre_vendedor\ttotal_usd\n2024-01-15\tAna\t10";
    match parse_sales_text(missing) {
        Err(SalesError::MissingRequiredColumns { missing }) => {
            assert_eq!(missing, vec!["nombre_sucursal".to_string()]);
        }
        other => panic!("expected missing column error, got {:?}", other),
    }

    assert!(matches!(
        parse_sales_text(HEADER),
        Err(SalesError::NoDataRows)
    ));

    let bad_date = format!(
        "{}\n2024-01-15\tAna\tCentro\tCliente\tToyota\t10\n15-01-2024x\tAna\tCentro\tCliente\tToyota\t10",
        HEADER
    );
    match parse_sales_text(&bad_date) {
        Err(SalesError::InvalidDate { line, value }) => {
            assert_eq!(line, 3);
            assert_eq!(value, "15-01-2024x");
        }
        other => panic!("expected invalid date error, got {:?}", other),
    }

    let short_rows = format!("{}\n2024-01-15\tAna\tCentro\tCliente\tToyota\t10\nbroken\trow", HEADER);
    let records = parse_sales_text(&short_rows).unwrap();
    assert_eq!(records.len(), 1);
}
