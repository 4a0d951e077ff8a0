//! Path and fixed-body constants for the gateway surface.

pub(super) const TEST_ENDPOINT: &str = "/test";
pub(super) const ERROR_ENDPOINT: &str = "/error";
pub(super) const AUTHORIZE_ENDPOINT: &str = "/authorize";
pub(super) const REDIRECT_URI_ENDPOINT: &str = "/redirect_uri";
pub(super) const INTERACTIVE_ENDPOINT: &str = "/slack/interactive-endpoint";
pub(super) const OPTIONS_LOAD_ENDPOINT: &str = "/slack/options-load-endpoint";

pub(super) const PAYLOAD_FIELD: &str = "payload";

pub(super) const TEST_BODY: &str = "API request received";
pub(super) const ERROR_DEMO_BODY: &str =
    "Since you requested the /error API endpoint I'll go ahead and serve back a 400";
pub(super) const ACKNOWLEDGED_BODY: &str = "Acknowledged";
pub(super) const REDIRECTING_BODY: &str = "Redirecting to identity provider";
pub(super) const PROVISION_SUCCESS_BODY: &str =
    "Success : OAuth access token has been provisioned and stored";
pub(super) const PROVISION_FAILURE_BODY: &str =
    "Unable to provision and store an OAuth access token";
pub(super) const NOT_FOUND_BODY: &str = "That path wasn't found";
pub(super) const INTERNAL_ERROR_BODY: &str = "Error";
