use serde::Deserialize;
use serde::Serialize;

/// Closed set of reasons a `SessionGate` may report a session as blocked.
/// The core never attempts credential entry; a blocked reason is always
/// terminal for the current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockedReason {
    CaptchaDetected,
    TwoFactorRequired,
    SecurityCheckRequired,
    TermsAgreementRequired,
    LoginFormStillVisible,
    SessionExpired,
}

impl std::fmt::Display for BlockedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BlockedReason::CaptchaDetected => "CAPTCHA_DETECTED",
            BlockedReason::TwoFactorRequired => "TWO_FACTOR_REQUIRED",
            BlockedReason::SecurityCheckRequired => "SECURITY_CHECK_REQUIRED",
            BlockedReason::TermsAgreementRequired => "TERMS_AGREEMENT_REQUIRED",
            BlockedReason::LoginFormStillVisible => "LOGIN_FORM_STILL_VISIBLE",
            BlockedReason::SessionExpired => "SESSION_EXPIRED",
        };
        f.write_str(s)
    }
}
