// ==========================================
// 机台排产系统 - 单元格取值解析
// ==========================================

/// 非数字单元格
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotANumber;

/// 布尔解析：TRUE / 1 / YES / ДА / Y / T（忽略大小写），其余为 false
pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_uppercase().as_str(),
        "TRUE" | "1" | "YES" | "ДА" | "Y" | "T"
    )
}

/// 逗号分隔列表，去空白并过滤空项
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// 整数解析（容忍千分位空格、小数逗号、"120.0" 这类表格导出的浮点文本，小数部分截断）
///
/// # 返回
/// - Ok(None): 空单元格
/// - Err(NotANumber): 非数字
pub fn parse_int(value: &str) -> Result<Option<i64>, NotANumber> {
    let cleaned: String = value
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if cleaned.is_empty() {
        return Ok(None);
    }
    if let Ok(v) = cleaned.parse::<i64>() {
        return Ok(Some(v));
    }
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v.trunc() as i64)),
        _ => Err(NotANumber),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_variants() {
        for v in ["TRUE", "true", "1", "yes", "Да", "y", " T "] {
            assert!(parse_bool(v), "{v} 应解析为 true");
        }
        for v in ["", "FALSE", "0", "нет", "maybe"] {
            assert!(!parse_bool(v), "{v} 应解析为 false");
        }
    }

    #[test]
    fn test_parse_list_drops_blank_items() {
        assert_eq!(
            parse_list("Соевый соус, Маринованный имбирь, ,"),
            vec!["Соевый соус", "Маринованный имбирь"]
        );
        assert!(parse_list("  ").is_empty());
    }

    #[test]
    fn test_parse_int_formats() {
        assert_eq!(parse_int("120"), Ok(Some(120)));
        assert_eq!(parse_int("120.0"), Ok(Some(120)));
        assert_eq!(parse_int("1 200"), Ok(Some(1200)));
        assert_eq!(parse_int("7,9"), Ok(Some(7)));
        assert_eq!(parse_int("-5"), Ok(Some(-5)));
        assert_eq!(parse_int(""), Ok(None));
        assert_eq!(parse_int("abc"), Err(NotANumber));
    }
}
