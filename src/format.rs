//! Money and percentage text shared by tables, chart labels and axes.

fn group_thousands(mut n: u64) -> String {
    let mut groups = Vec::new();
    loop {
        if n < 1000 {
            groups.push(n.to_string());
            break;
        }
        groups.push(format!("{:03}", n % 1000));
        n /= 1000;
    }
    groups.reverse();
    groups.join(",")
}

fn split_cents(value: f64) -> (bool, u64, u64) {
    if !value.is_finite() {
        return (false, 0, 0);
    }
    let cents = (value.abs() * 100.0).round() as u64;
    (value < 0.0 && cents != 0, cents / 100, cents % 100)
}

/// Table form: always two decimals, e.g. `$1,234.50`, `-$57.48`.
pub fn money(value: f64) -> String {
    let (negative, whole, cents) = split_cents(value);
    let sign = if negative { "-" } else { "" };
    format!("{sign}${}.{cents:02}", group_thousands(whole))
}

/// Axis/label form: decimals only when present, e.g. `$1,500`, `$1,234.5`.
pub fn currency_label(value: f64) -> String {
    let (negative, whole, cents) = split_cents(value);
    let sign = if negative { "-" } else { "" };
    let mut out = format!("{sign}${}", group_thousands(whole));
    if cents != 0 {
        let frac = format!("{cents:02}");
        out.push('.');
        out.push_str(frac.trim_end_matches('0'));
    }
    out
}

/// Signed amount the way the transaction list shows it: `+$12.00` / `-$12.00`.
pub fn signed_money(value: f64, income: bool) -> String {
    let sign = if income { "+" } else { "-" };
    format!("{sign}{}", money(value.abs()))
}

/// One decimal place, e.g. `104.0%`.
pub fn percent(value: f64) -> String {
    let v = if value.is_finite() { value } else { 0.0 };
    format!("{v:.1}%")
}

/// Rounded to a whole number, e.g. `104%`.
pub fn percent_rounded(value: f64) -> String {
    let v = if value.is_finite() { value } else { 0.0 };
    format!("{}%", v.round() as i64)
}
