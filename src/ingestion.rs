use crate::error::{Result, SalesError};
use crate::schema::{SalesRecord, SalesRow};
use csv::{ReaderBuilder, Trim};
use log::{debug, info};
use std::collections::HashMap;

/// Columns every upload must carry (matched case-insensitively).
pub const REQUIRED_COLUMNS: [&str; 4] = ["fec_emis", "nombre_vendedor", "nombre_sucursal", "total_usd"];

/// Human-readable brand header accepted in place of `marcas_de_vehiculos`.
pub const BRAND_HEADER_ALIAS: &str = "Marcas de Vehiculos";

/// Rows with fewer fields than this are dropped.
const MIN_ROW_FIELDS: usize = 4;

const SAMPLE_ROWS: [[&str; 21]; 7] = [
    [
        "id_documento", "tipo_documento", "doc_num", "fec_emis", "co_ven", "nombre_vendedor",
        "co_cond", "co_cli", "nombre_cliente", "tipo_venta", "tasa", "co_sucu_in",
        "nombre_sucursal", "co_art", "des_art", "total_art", "prec_vta", "reng_neto",
        "monto_imp", "total_usd", BRAND_HEADER_ALIAS,
    ],
    [
        "FAC001", "FACTURA", "F-2024-001", "2024-01-15", "V001", "Juan Pérez",
        "CONTADO", "C001", "AutoDealer Central", "DIRECTA", "1.00", "S001",
        "Sucursal Centro", "ART001", "Aceite Motor 5W30", "2", "45.50", "91.00",
        "14.56", "105.56", "Toyota",
    ],
    [
        "FAC002", "FACTURA", "F-2024-002", "2024-01-16", "V002", "María García",
        "CREDITO", "C002", "Repuestos Norte SA", "MAYORISTA", "1.00", "S002",
        "Sucursal Norte", "ART002", "Filtro de Aire", "5", "28.75", "143.75",
        "23.00", "166.75", "Honda",
    ],
    [
        "FAC003", "FACTURA", "F-2024-003", "2024-01-17", "V003", "Carlos López",
        "CONTADO", "C003", "Taller Mecánico Sur", "DIRECTA", "1.00", "S003",
        "Sucursal Sur", "ART003", "Pastillas de Freno", "1", "85.00", "85.00",
        "13.60", "98.60", "Ford",
    ],
    [
        "FAC004", "FACTURA", "F-2024-004", "2024-01-18", "V001", "Juan Pérez",
        "CREDITO", "C004", "AutoPartes Express", "MAYORISTA", "1.00", "S001",
        "Sucursal Centro", "ART004", "Batería 12V", "3", "120.00", "360.00",
        "57.60", "417.60", "Chevrolet",
    ],
    [
        "FAC005", "FACTURA", "F-2024-005", "2024-01-19", "V004", "Ana Rodríguez",
        "CONTADO", "C005", "Lubricantes del Este", "DIRECTA", "1.00", "S002",
        "Sucursal Norte", "ART005", "Llanta 195/65R15", "4", "95.25", "381.00",
        "60.96", "441.96", "Nissan",
    ],
    [
        "FAC006", "FACTURA", "F-2024-006", "2024-01-20", "V002", "María García",
        "CONTADO", "C006", "Servicios Automotrices", "DIRECTA", "1.00", "S003",
        "Sucursal Sur", "ART006", "Amortiguador Delantero", "2", "150.00", "300.00",
        "48.00", "348.00", "Hyundai",
    ],
];

/// Header cells may be separated by tabs, commas or semicolons.
pub fn split_header(line: &str) -> Vec<String> {
    line.split(['\t', ',', ';'])
        .map(|cell| cell.trim().to_string())
        .collect()
}

/// Fast pre-check run before any row is parsed.
pub fn validate_headers(content: &str) -> Result<()> {
    let content = content.trim();
    let mut lines = content.lines();

    let headers: Vec<String> = lines
        .next()
        .map(split_header)
        .unwrap_or_default()
        .into_iter()
        .map(|h| h.to_lowercase())
        .collect();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|required| !headers.iter().any(|h| h == *required))
        .map(|required| required.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(SalesError::MissingRequiredColumns { missing });
    }

    if lines.all(|line| line.trim().is_empty()) {
        return Err(SalesError::NoDataRows);
    }

    Ok(())
}

/// Parses tab-delimited sales data whose first line names the columns.
///
/// Short rows are skipped, unparseable numbers become `0.0`, missing text
/// becomes an empty string. A row whose issue date cannot be read fails the
/// whole upload with [`SalesError::InvalidDate`].
pub fn parse_sales_text(content: &str) -> Result<Vec<SalesRecord>> {
    validate_headers(content)?;

    let content = content.trim();
    let (header_line, body) = content.split_once('\n').unwrap_or((content, ""));
    let headers = split_header(header_line);

    // validation matched these ignoring case, but cells are looked up by exact name
    let misnamed: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|required| !headers.iter().any(|h| h == *required))
        .map(|required| required.to_string())
        .collect();
    if !misnamed.is_empty() {
        return Err(SalesError::MisnamedColumns { columns: misnamed });
    }

    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(Trim::All)
        .from_reader(body.as_bytes());

    let mut records = Vec::new();
    let mut dropped = 0usize;

    for result in reader.records() {
        let fields = result?;
        // +1 for the header line
        let line = fields
            .position()
            .map(|p| p.line() as usize + 1)
            .unwrap_or(records.len() + dropped + 2);

        if fields.len() < MIN_ROW_FIELDS {
            dropped += 1;
            debug!("Dropping line {} with {} fields", line, fields.len());
            continue;
        }

        let cells: HashMap<&str, &str> = headers
            .iter()
            .enumerate()
            .map(|(idx, header)| (header.as_str(), fields.get(idx).unwrap_or("")))
            .collect();

        let row = row_from_cells(&cells);
        let issue_date = row.issue_date.clone();
        let record = SalesRecord::from_row(row)
            .map_err(|_| SalesError::InvalidDate { line, value: issue_date })?;
        records.push(record);
    }

    info!(
        "Parsed {} sales records ({} short rows dropped)",
        records.len(),
        dropped
    );

    Ok(records)
}

fn row_from_cells(cells: &HashMap<&str, &str>) -> SalesRow {
    let text = |name: &str| cells.get(name).copied().unwrap_or("").to_string();
    let number = |name: &str| parse_amount(cells.get(name).copied().unwrap_or(""));

    let vehicle_brand = match cells.get("marcas_de_vehiculos") {
        Some(brand) if !brand.is_empty() => brand.to_string(),
        _ => text(BRAND_HEADER_ALIAS),
    };

    SalesRow {
        document_id: text("id_documento"),
        document_type: text("tipo_documento"),
        document_number: text("doc_num"),
        issue_date: text("fec_emis"),
        salesperson_code: text("co_ven"),
        salesperson_name: text("nombre_vendedor"),
        payment_terms: text("co_cond"),
        client_code: text("co_cli"),
        client_name: text("nombre_cliente"),
        sale_type: text("tipo_venta"),
        exchange_rate: number("tasa"),
        branch_code: text("co_sucu_in"),
        branch_name: text("nombre_sucursal"),
        item_code: text("co_art"),
        item_description: text("des_art"),
        quantity: number("total_art"),
        unit_price: number("prec_vta"),
        net_amount: number("reng_neto"),
        tax_amount: number("monto_imp"),
        total_usd: number("total_usd"),
        vehicle_brand,
    }
}

/// Numeric cells degrade to zero instead of rejecting the row.
pub fn parse_amount(value: &str) -> f64 {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Six-row demo upload in the accepted input format.
pub fn generate_sample_csv() -> String {
    SAMPLE_ROWS
        .iter()
        .map(|row| row.join("\t"))
        .collect::<Vec<_>>()
        .join("\n")
}
