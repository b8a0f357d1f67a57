#[cfg(test)]
mod tests {
    use crate::ImageSummary;
    use crate::ImageSummaryStatus;
    use crate::OverallStatus;

    fn summary(status: ImageSummaryStatus) -> ImageSummary {
        ImageSummary {
            requested_count: 1,
            uploaded_count: 1,
            missing_count: 0,
            editor_image_count: 1,
            status,
            sample_refs: Vec::new(),
        }
    }

    #[test]
    fn draft_failure_always_wins() {
        let s = summary(ImageSummaryStatus::Full);
        assert_eq!(
            OverallStatus::derive(false, &s, true, false),
            OverallStatus::Failed
        );
    }

    #[test]
    fn strict_enforcement_fails_on_partial_images() {
        let s = summary(ImageSummaryStatus::Partial);
        assert_eq!(
            OverallStatus::derive(true, &s, true, false),
            OverallStatus::Failed
        );
    }

    #[test]
    fn non_strict_partial_images_is_success_partial() {
        let s = summary(ImageSummaryStatus::Partial);
        assert_eq!(
            OverallStatus::derive(true, &s, false, false),
            OverallStatus::SuccessPartialImages
        );
    }

    #[test]
    fn text_only_run_is_success_text_only() {
        let s = ImageSummary::not_requested();
        assert_eq!(
            OverallStatus::derive(true, &s, true, false),
            OverallStatus::SuccessTextOnly
        );
    }

    #[test]
    fn full_images_with_verify_warning_downgrades() {
        let s = summary(ImageSummaryStatus::Full);
        assert_eq!(
            OverallStatus::derive(true, &s, true, true),
            OverallStatus::SuccessWithImageVerifyWarning
        );
    }
}
