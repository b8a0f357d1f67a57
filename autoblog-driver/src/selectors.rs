/// Named groups of CSS selectors the Driver Facade tries in order. Kept as
/// an enum (rather than letting callers pass raw selector lists) so the
/// concrete selector strings live in exactly one place and can drift with
/// the third-party editor's markup without touching `autoblog-core`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectorFamily {
    Toast,
    Spinner,
    Overlay,
    SaveButton,
    PublishButton,
    DraftsCountButton,
    QuoteMenuTrigger,
    QuoteLevelOneOption,
    QuoteLevelTwoOption,
    QuoteBlock,
    FileInput,
    ImageInsertButton,
    EditableRoot,
    ToolbarRoot,
    LoginForm,
    ConfirmDialogButton,
    DraftsPanelLink,
}

impl SelectorFamily {
    /// CSS selectors tried in order, most specific first. A later selector
    /// is only tried once every earlier one fails to match a visible
    /// element — this is the "multi-strategy" idea applied to DOM lookup
    /// itself, not just to text insertion.
    pub fn selectors(self) -> &'static [&'static str] {
        match self {
            SelectorFamily::Toast => &[
                ".se-toast-message",
                ".toast_message",
                "[role=\"status\"]",
                ".notification_message",
            ],
            SelectorFamily::Spinner => &[
                ".se-loading-spinner",
                ".spinner",
                "[class*=\"loading\"]",
                "[class*=\"spinner\"]",
            ],
            SelectorFamily::Overlay => &[
                ".se-popup-dim",
                ".dimmed",
                "[class*=\"overlay\"]",
                "[role=\"dialog\"]",
            ],
            SelectorFamily::SaveButton => &[
                "button.save_btn:not([class*=\"count\"])",
                "button[data-name=\"temp-save\"]",
                "button[data-log=\"SAVE\"]",
            ],
            SelectorFamily::PublishButton => &[
                "button[data-name=\"publish\"]",
                "button[data-log=\"PUBLISH\"]",
                ".publish_btn__M9KqF",
            ],
            SelectorFamily::DraftsCountButton => {
                &["button.save_btn[class*=\"count\"]", ".draft_count_btn"]
            }
            SelectorFamily::QuoteMenuTrigger => {
                &["button[data-name=\"quotation\"]", "button[data-name=\"format\"]"]
            }
            SelectorFamily::QuoteLevelOneOption => &[
                "[data-value=\"quotation_type1\"]",
                ".quotation_type1",
            ],
            SelectorFamily::QuoteLevelTwoOption => &[
                "[data-value=\"quotation_type2\"]",
                ".quotation_type2",
            ],
            // The inserted quote component itself, not the menu that opens it.
            SelectorFamily::QuoteBlock => &[
                ".se-quotation",
                "[class*=\"se-component-quotation\"]",
                "blockquote",
            ],
            SelectorFamily::FileInput => &["input[type=\"file\"]"],
            SelectorFamily::ImageInsertButton => &[
                "button[data-name=\"image\"]",
                ".se-image-toolbar-button",
            ],
            SelectorFamily::EditableRoot => &["[contenteditable=\"true\"]"],
            SelectorFamily::ToolbarRoot => &[".se-toolbar", "[class*=\"toolbar\"]"],
            SelectorFamily::LoginForm => &["form#frmNIDLogin", "form[action*=\"login\"]"],
            SelectorFamily::ConfirmDialogButton => {
                &["button.se-popup-button-confirm", "button[data-log=\"CONFIRM\"]"]
            }
            SelectorFamily::DraftsPanelLink => &[
                ".draft_list a[href]",
                "[class*=\"draft\"] a[href]",
            ],
        }
    }
}
