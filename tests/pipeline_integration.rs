//! End-to-end runs of the upload pipeline: filename routing, parsing, and
//! deduplicated persistence behind one call.

use std::sync::Arc;

use anyhow::Result;
use encoding_rs::GBK;
use qianji::error::ParseError;
use qianji::import::ImportService;
use qianji::models::{Id, Platform};
use qianji::parse::BillParserFactory;
use qianji::storage::{BillStore, MemoryStore};

const ALIPAY_SAMPLE: &str = "\
支付宝交易记录明细查询
账号:[example@mail.com]
交易号,商家订单号,交易创建时间,付款时间,最近修改时间,交易来源地,类型,交易对方,商品名称,金额（元）,收/支,交易状态
12345,67890,2024-07-22 10:00:00,2024-07-22 10:00:00,2024-07-22 10:00:00,来源,支出,对方,淘宝购物,-100.00,支出,交易成功
";

fn gbk(text: &str) -> Vec<u8> {
    let (bytes, _, _) = GBK.encode(text);
    bytes.into_owned()
}

fn service(store: Arc<MemoryStore>) -> ImportService {
    ImportService::new(BillParserFactory::new(), store)
}

#[tokio::test]
async fn alipay_upload_lands_in_storage_with_its_platform_tag() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let service = service(store.clone());
    let owner = Id::from_string("user-1");

    let summary = service
        .import_file(&owner, "支付宝账单.csv", &gbk(ALIPAY_SAMPLE))
        .await?;

    assert_eq!(summary.platform, Platform::Alipay);
    assert_eq!(summary.created, 1);
    assert_eq!(summary.skipped, 0);

    let bills = store.list_bills(&owner).await?;
    assert_eq!(bills.len(), 1);
    assert_eq!(bills[0].title, "淘宝购物");
    assert_eq!(bills[0].platform, Platform::Alipay);

    // Second upload of the same file only skips.
    let summary = service
        .import_file(&owner, "支付宝账单.csv", &gbk(ALIPAY_SAMPLE))
        .await?;
    assert_eq!(summary.created, 0);
    assert_eq!(summary.skipped, 1);
    Ok(())
}

#[tokio::test]
async fn platform_token_in_filename_beats_the_csv_fallback() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let service = service(store);
    let owner = Id::from_string("user-1");

    // The file is named .csv, but the alipay token routes it to the Alipay
    // parser, which reads it as GBK with header detection.
    let summary = service
        .import_file(&owner, "alipay_bill.csv", &gbk(ALIPAY_SAMPLE))
        .await?;
    assert_eq!(summary.platform, Platform::Alipay);
    Ok(())
}

#[tokio::test]
async fn unsupported_filename_fails_with_a_named_error() {
    let store = Arc::new(MemoryStore::new());
    let service = service(store);
    let owner = Id::from_string("user-1");

    let err = service
        .import_file(&owner, "statement.pdf", b"whatever")
        .await
        .unwrap_err();
    assert!(matches!(err, ParseError::UnsupportedFormat { .. }));
    assert!(err.to_string().contains("statement.pdf"));
}

#[tokio::test]
async fn header_only_upload_reports_zero_counts() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let service = service(store);
    let owner = Id::from_string("user-1");

    let summary = service
        .import_file(&owner, "other_bill.csv", "日期,金额,描述\n".as_bytes())
        .await?;
    assert_eq!(summary.platform, Platform::Csv);
    assert_eq!(summary.created, 0);
    assert_eq!(summary.skipped, 0);
    Ok(())
}
