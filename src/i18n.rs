// ==========================================
// 机台排产系统 - 消息本地化
// ==========================================
// 支持语言: zh-CN（默认）、en
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

pub const DEFAULT_LOCALE: &str = "zh-CN";
pub const SUPPORTED_LOCALES: [&str; 2] = ["zh-CN", "en"];

pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 切换语言
///
/// # 返回
/// 不支持的语言返回 false，当前语言保持不变
pub fn set_locale(locale: &str) -> bool {
    match SUPPORTED_LOCALES.iter().find(|l| l.eq_ignore_ascii_case(locale.trim())) {
        Some(supported) => {
            rust_i18n::set_locale(supported);
            true
        }
        None => false,
    }
}

pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译并替换 %{name} 占位符
///
/// ```no_run
/// use machine_plan_aps::i18n::t_with_args;
/// let msg = t_with_args("report.brand_line", &[("brand", "Kikkoman"), ("qty", "120")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    args.iter().fold(t(key), |text, (name, value)| {
        text.replace(&format!("%{{{}}}", name), value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // locale 是全局状态，相关测试串行执行
    static LOCALE_TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_set_locale_accepts_supported_only() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        assert!(set_locale("en"));
        assert_eq!(current_locale(), "en");

        assert!(!set_locale("de"));
        assert_eq!(current_locale(), "en");

        assert!(set_locale(" ZH-cn "));
        assert_eq!(current_locale(), DEFAULT_LOCALE);
    }

    #[test]
    fn test_report_texts_per_locale() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        set_locale("zh-CN");
        assert_eq!(t("report.future_header"), "后续排产");

        set_locale("en");
        assert_eq!(t("report.future_header"), "Upcoming plan");

        set_locale(DEFAULT_LOCALE);
    }

    #[test]
    fn test_translate_with_args() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        set_locale("zh-CN");
        let msg = t_with_args("report.brand_line", &[("brand", "Kikkoman"), ("qty", "120")]);
        assert_eq!(msg, "Kikkoman：120 箱");

        set_locale("en");
        let msg = t_with_args("report.fatal_error", &[("source", "machines"), ("message", "empty")]);
        assert_eq!(msg, "Planning failed (machines): empty");

        set_locale(DEFAULT_LOCALE);
    }
}
