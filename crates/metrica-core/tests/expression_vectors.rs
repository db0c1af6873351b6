//! Date-expression vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use chrono::{DateTime, Utc};

use metrica_core::time::parse_date_expression;


fn instant(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

#[test]
fn date_expression_vectors() {
    let file = vector_loader::load("date_expressions.json");
    let now = instant(file.now.as_deref().expect("vector file needs now"));

    for case in file.cases {
        let res = parse_date_expression(&case.input, now);

        if let Some(err) = case.expect_error {
            let e = res.expect_err("expected parse failure");
            assert_eq!(err.code, "PARSE_FAILURE", "vector={} input={:?}", file.description, case.input);
            assert_eq!(e.input, case.input);
            continue;
        }

        let expect = case.expect.expect("missing expect");
        let want = instant(expect.as_str().unwrap());
        assert_eq!(res.unwrap(), want, "vector={} input={:?}", file.description, case.input);
    }
}
