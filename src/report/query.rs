//! 日付・サービスIDからリクエストURLを組み立てる

use chrono::{Days, Local, NaiveDate, TimeZone};
use url::Url;

use crate::error::ReportError;

use super::types::{ReportQuery, ServiceIds};

const DATE_FORMAT: &str = "%Y-%m-%d";
/// 開始日省略時は終了日のこの日数前
const DEFAULT_RANGE_DAYS: u64 = 6;

/// `YYYY-MM-DD` をパース
pub fn parse_date(input: &str) -> Result<NaiveDate, ReportError> {
    NaiveDate::parse_from_str(input, DATE_FORMAT).map_err(|_| ReportError::InvalidDate {
        input: input.to_string(),
    })
}

/// 日付のローカル0時をエポックミリ秒に変換
pub fn date_to_timestamp_ms(date: NaiveDate) -> Result<i64, ReportError> {
    let invalid = || ReportError::InvalidDate {
        input: date.format(DATE_FORMAT).to_string(),
    };

    let midnight = date.and_hms_opt(0, 0, 0).ok_or_else(invalid)?;
    // DSTで0時が存在しない地域では最も早い有効時刻
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.timestamp_millis())
        .ok_or_else(invalid)
}

/// 文字列の日付をエポックミリ秒に変換
pub fn date_str_to_timestamp_ms(input: &str) -> Result<i64, ReportError> {
    date_to_timestamp_ms(parse_date(input)?)
}

/// 省略された日付を補う（終了日=今日、開始日=終了日の6日前）
pub fn resolve_date_range(
    start: Option<&str>,
    end: Option<&str>,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate), ReportError> {
    let end_date = match end {
        Some(s) => parse_date(s)?,
        None => today,
    };
    let start_date = match start {
        Some(s) => parse_date(s)?,
        None => end_date
            .checked_sub_days(Days::new(DEFAULT_RANGE_DAYS))
            .unwrap_or(end_date),
    };
    Ok((start_date, end_date))
}

impl ReportQuery {
    /// 入力値を検証してクエリを作る（ネットワークアクセス前に失敗する）
    pub fn resolve(
        start: Option<&str>,
        end: Option<&str>,
        svc_ids: &ServiceIds,
        cus_id: u32,
        pro_id: u32,
        default_svc_ids: &str,
        today: NaiveDate,
    ) -> Result<Self, ReportError> {
        let (start_date, end_date) = resolve_date_range(start, end, today)?;

        let start_ts = date_to_timestamp_ms(start_date)?;
        let end_ts = date_to_timestamp_ms(end_date)?;
        if start_ts > end_ts {
            return Err(ReportError::InvalidRange {
                start: start_date.format(DATE_FORMAT).to_string(),
                end: end_date.format(DATE_FORMAT).to_string(),
            });
        }

        Ok(Self {
            cus_id,
            pro_id,
            start_date,
            end_date,
            start_ts,
            end_ts,
            svc_ids: svc_ids.normalize(default_svc_ids),
        })
    }
}

/// エンコード済みURLの `%2C` をカンマに戻す
///
/// downBaseInfo は `date` と `svc_id` にエンコードされていないカンマを要求する。
/// 一般的なURLエンコード方針ではなく、このエンドポイント専用の互換処理。
pub fn restore_literal_commas(url: &str) -> String {
    url.replace("%2C", ",")
}

/// レポート取得URLを組み立てる
pub fn build_report_url(endpoint: &str, query: &ReportQuery) -> Result<String, ReportError> {
    let url = Url::parse_with_params(endpoint, query.params())?;
    Ok(restore_literal_commas(url.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENDPOINT: &str = "https://www.wareconn.com/r/Summary/downBaseInfo";
    const DEFAULT_IDS: &str = "879,898,1145";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn query(start: &str, end: &str, ids: ServiceIds) -> ReportQuery {
        ReportQuery::resolve(Some(start), Some(end), &ids, 316, 492, DEFAULT_IDS, today()).unwrap()
    }

    #[test]
    fn test_parse_date_rejects_malformed() {
        for bad in ["2024/01/01", "2024-02-30", "yesterday", "2024-01-01x", ""] {
            match parse_date(bad) {
                Err(ReportError::InvalidDate { input }) => assert_eq!(input, bad),
                other => panic!("{:?} parsed as {:?}", bad, other),
            }
        }
    }

    #[test]
    fn test_invalid_date_string_is_error() {
        let err = date_str_to_timestamp_ms("2024-13-01").unwrap_err();
        assert!(err.to_string().contains("2024-13-01"));
    }

    #[test]
    fn test_timestamps_monotonic() {
        let pairs = [
            ("2024-01-01", "2024-01-01"),
            ("2024-01-01", "2024-01-02"),
            ("2023-12-31", "2024-01-01"),
            ("2024-03-09", "2024-03-11"),
            ("2024-10-26", "2024-10-28"),
            ("2020-02-28", "2020-03-01"),
            ("1999-06-30", "2030-06-30"),
        ];
        for (start, end) in pairs {
            let s = date_str_to_timestamp_ms(start).unwrap();
            let e = date_str_to_timestamp_ms(end).unwrap();
            assert!(s <= e, "{} -> {} not monotonic", start, end);
        }
    }

    #[test]
    fn test_timestamp_is_local_midnight() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let ts = date_to_timestamp_ms(date).unwrap();
        let local = Local.timestamp_millis_opt(ts).unwrap().naive_local();
        assert_eq!(local.date(), date);
        assert_eq!(local.time(), chrono::NaiveTime::from_hms_opt(0, 0, 0).unwrap());
    }

    #[test]
    fn test_resolve_date_defaults() {
        let (start, end) = resolve_date_range(None, None, today()).unwrap();
        assert_eq!(end, today());
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());

        let (start, end) = resolve_date_range(None, Some("2024-01-03"), today()).unwrap();
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        assert_eq!(start, NaiveDate::from_ymd_opt(2023, 12, 28).unwrap());
    }

    #[test]
    fn test_resolve_rejects_reversed_range() {
        let err = ReportQuery::resolve(
            Some("2024-03-10"),
            Some("2024-03-01"),
            &ServiceIds::Default,
            316,
            492,
            DEFAULT_IDS,
            today(),
        )
        .unwrap_err();
        assert!(matches!(err, ReportError::InvalidRange { .. }));
        assert!(err.is_input_error());
    }

    #[test]
    fn test_resolve_bad_start_names_input() {
        let err = ReportQuery::resolve(
            Some("03/01/2024"),
            None,
            &ServiceIds::Default,
            316,
            492,
            DEFAULT_IDS,
            today(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("03/01/2024"));
    }

    #[test]
    fn test_params_order_and_values() {
        let q = query("2024-03-01", "2024-03-07", ServiceIds::from("42"));
        let names: Vec<_> = q.params().iter().map(|(k, _)| *k).collect();
        assert_eq!(
            names,
            vec![
                "cusId", "proId", "stcName", "date", "pn", "pmoId", "svc_id", "svcNow_id",
                "acc_id", "type"
            ]
        );
        let params = q.params();
        assert_eq!(params[3].1, format!("{},{}", q.start_ts, q.end_ts));
        assert_eq!(params[6].1, "42");
        assert_eq!(params[9].1, "0");
    }

    #[test]
    fn test_build_url_keeps_literal_commas() {
        let q = query(
            "2024-03-01",
            "2024-03-07",
            ServiceIds::List(vec!["879".into(), "898".into(), "1145".into()]),
        );
        let url = build_report_url(ENDPOINT, &q).unwrap();

        assert!(!url.contains("%2C"));
        assert!(url.starts_with(ENDPOINT));
        assert!(url.contains(&format!("date={},{}", q.start_ts, q.end_ts)));
        assert!(url.contains("svc_id=879,898,1145"));
        assert!(url.contains("cusId=316&proId=492&stcName=&date="));
        assert!(url.ends_with("&acc_id=&type=0"));
    }

    #[test]
    fn test_build_url_encodes_other_reserved() {
        let q = query(
            "2024-03-01",
            "2024-03-07",
            ServiceIds::List(vec!["a&b".into(), "c/d".into(), "e=f".into(), "g h".into()]),
        );
        let url = build_report_url(ENDPOINT, &q).unwrap();

        assert!(!url.contains("%2C"));
        assert!(url.contains("svc_id=a%26b,c%2Fd,e%3Df,g+h"));
    }

    #[test]
    fn test_restore_literal_commas_only_touches_commas() {
        assert_eq!(
            restore_literal_commas("https://h/p?a=1%2C2&b=%2F%26"),
            "https://h/p?a=1,2&b=%2F%26"
        );
    }
}
