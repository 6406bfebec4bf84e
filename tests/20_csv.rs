use anyhow::Result;

use listing_bulk_api::csv_io::{check_upload, from_csv, parse, template_csv, to_csv, ColumnMapping, CsvError, ExportRecord};

fn ten_row_csv_with_blank_name_on_row_four() -> String {
    let mut csv = String::from("Product Name,Niche,Target Audience,Keywords,Tone\n");
    for i in 1..=10 {
        let name = if i == 4 { String::new() } else { format!("Product {}", i) };
        csv.push_str(&format!("{},Home,Gift buyers,\"gift, decor\",warm\n", name));
    }
    csv
}

#[test]
fn invalid_row_is_reported_by_number_and_kept_out_of_ready_set() -> Result<()> {
    let parsed = parse(&ten_row_csv_with_blank_name_on_row_four(), None)?;

    assert_eq!(parsed.total_rows, 10);
    assert_eq!(parsed.rows.len(), 9);
    assert_eq!(parsed.validation_errors.len(), 1);
    assert_eq!(parsed.validation_errors[0].row, 4);
    assert_eq!(parsed.validation_errors[0].field, "productName");
    assert!(parsed.rows.iter().all(|r| r.product_name != ""));
    assert_eq!(parsed.rows[3].product_name, "Product 5");
    assert_eq!(parsed.column_mapping.audience.as_deref(), Some("Target Audience"));
    Ok(())
}

#[test]
fn missing_required_column_needs_mapping() -> Result<()> {
    let parsed = parse("Widget,Labels\nMug,coffee\n", None)?;
    assert!(parsed.needs_mapping());
    assert!(parsed.rows.is_empty());

    let mapping = ColumnMapping {
        product_name: Some("Widget".into()),
        keywords: Some("Labels".into()),
        ..Default::default()
    };
    let parsed = parse("Widget,Labels\nMug,coffee\n", Some(&mapping))?;
    assert!(!parsed.needs_mapping());
    assert_eq!(parsed.rows[0].product_name, "Mug");
    assert_eq!(parsed.rows[0].keywords, vec!["coffee"]);
    Ok(())
}

#[test]
fn upload_constraints_are_checked_before_parsing() {
    assert!(matches!(
        check_upload("data.txt", b"a,b\n", 1024),
        Err(CsvError::InvalidExtension(_))
    ));
    assert!(matches!(
        check_upload("data.csv", &[b'x'; 2048], 1024),
        Err(CsvError::TooLarge { size: 2048, limit: 1024 })
    ));
    assert!(matches!(check_upload("data.csv", b"\xEF\xBB\xBF  \n", 1024), Err(CsvError::Empty)));
    assert!(matches!(check_upload("data.csv", &[0xff, 0xfe], 1024), Err(CsvError::InvalidEncoding)));
    assert!(check_upload("DATA.CSV", b"Product Name,Keywords\nMug,coffee\n", 1024).is_ok());
}

#[test]
fn export_round_trips_through_import_format() -> Result<()> {
    let records = vec![
        ExportRecord {
            product_name: "Mug, large".into(),
            niche: Some("Kitchen".into()),
            audience: None,
            keywords: vec!["coffee".into(), "tea".into()],
            tone: Some("warm".into()),
            title: "Large \"Cosy\" Mug".into(),
            description: "Line one.\nLine two.".into(),
            tags: (1..=13).map(|i| format!("tag {}", i)).collect(),
            materials: (1..=13).map(|i| format!("clay {}", i)).collect(),
        },
        ExportRecord {
            product_name: "Candle".into(),
            niche: None,
            audience: Some("Students".into()),
            keywords: vec!["soy".into()],
            tone: None,
            title: "Soy Candle".into(),
            description: "Smells nice.".into(),
            tags: (1..=13).map(|i| format!("t{}", i)).collect(),
            materials: (1..=13).map(|i| format!("m{}", i)).collect(),
        },
    ];

    let csv = to_csv(&records)?;
    assert!(csv.starts_with('\u{feff}'));
    assert_eq!(from_csv(&csv)?, records);

    // The leading columns are the import template
    let reparsed = parse(&csv, None)?;
    assert_eq!(reparsed.rows.len(), 2);
    assert_eq!(reparsed.rows[0].product_name, "Mug, large");
    assert_eq!(reparsed.rows[1].audience.as_deref(), Some("Students"));
    Ok(())
}

#[test]
fn template_parses_as_one_ready_row() -> Result<()> {
    let template = template_csv()?;
    let parsed = parse(&template, None)?;
    assert!(!parsed.needs_mapping());
    assert_eq!(parsed.rows.len(), 1);
    assert!(parsed.validation_errors.is_empty());
    Ok(())
}
