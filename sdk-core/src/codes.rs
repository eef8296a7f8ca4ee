//! Server error code table.
//!
//! Maps the machine-readable codes the backend reports to the HTTP status it
//! uses for them. Used when a legacy error string carries only a code.

/// Canonical HTTP status for a server error code, `None` if unknown.
pub fn status_for_code(code: &str) -> Option<i32> {
    let status = match code {
        // 400
        "BAD_REQUEST"
        | "INVALID_INPUT_DATA"
        | "INVALID_JSON"
        | "INVALID_JSON_SCHEMA"
        | "INVALID_BUCKET"
        | "INVALID_BUCKET_NAME"
        | "INVALID_OBJECT_ID"
        | "INVALID_ACCOUNT_STATUS"
        | "INVALID_USERNAME"
        | "INVALID_PASSWORD"
        | "INVALID_EMAIL"
        | "INVALID_PHONE"
        | "INVALID_COUNTRY"
        | "INVALID_LOCALE"
        | "INVALID_DISPLAY_NAME"
        | "INVALID_LOGIN_NAME"
        | "INVALID_GROUP_NAME"
        | "INVALID_TOPIC_NAME"
        | "INVALID_THING"
        | "INVALID_VENDOR_THING_ID"
        | "INVALID_THING_PASSWORD"
        | "INVALID_THING_TYPE"
        | "INVALID_LAYOUT_POSITION"
        | "INVALID_FIELDS"
        | "INVALID_QUERY"
        | "INVALID_QUERY_CLAUSE"
        | "INVALID_ORDER_BY"
        | "INVALID_PAGINATION_KEY"
        | "INVALID_BEST_EFFORT_LIMIT"
        | "INVALID_CONTENT_TYPE"
        | "INVALID_DATA_TYPE"
        | "INVALID_RANGE_HEADER"
        | "INVALID_ACL_ENTRY"
        | "INVALID_ACL_ACTION"
        | "INVALID_ACL_SUBJECT"
        | "INVALID_PUSH_MESSAGE"
        | "INVALID_PUSH_FILTER"
        | "INVALID_INSTALLATION"
        | "INVALID_DEVICE_TYPE"
        | "INVALID_SERVER_CODE"
        | "INVALID_HOOK_CONFIG"
        | "INVALID_SCHEDULE"
        | "INVALID_VERIFICATION_CODE"
        | "INVALID_REDIRECT_URI"
        | "INVALID_GRANT_TYPE"
        | "INVALID_SCOPE"
        | "INVALID_ENCODING"
        | "INVALID_HEADER"
        | "QUERY_NOT_SUPPORTED"
        | "QUERY_TOO_COMPLEX"
        | "FIELD_NAME_RESERVED"
        | "FIELD_TOO_LONG"
        | "PASSWORD_TOO_SHORT"
        | "PASSWORD_TOO_LONG"
        | "MISSING_FIELD"
        | "MISSING_CONTENT_TYPE"
        | "MISSING_OBJECT_BODY"
        | "EMPTY_BODY"
        | "UNSUPPORTED_CONTENT_TYPE_FOR_UPLOAD"
        | "BODY_TOO_SHORT"
        | "TRANSACTION_NOT_SUPPORTED"
        | "PUSH_SUBSCRIPTION_LIMIT"
        | "SCRIPT_SYNTAX_ERROR"
        | "ENDPOINT_INVOCATION_ERROR"
        | "VALIDATION_ERROR"
        | "invalid_request"
        | "invalid_grant"
        | "unsupported_grant_type" => 400,

        // 401
        "UNAUTHORIZED"
        | "WRONG_TOKEN"
        | "TOKEN_EXPIRED"
        | "INVALID_TOKEN"
        | "MISSING_TOKEN"
        | "AUTHENTICATION_FAILED"
        | "INVALID_CREDENTIALS"
        | "INVALID_APP_CREDENTIALS"
        | "SESSION_EXPIRED"
        | "invalid_client" => 401,

        // 403
        "FORBIDDEN"
        | "ACCESS_DENIED"
        | "WRONG_PASSWORD"
        | "USER_DISABLED"
        | "USER_LOCKED"
        | "USER_NOT_VERIFIED"
        | "APP_DISABLED"
        | "APP_SUSPENDED"
        | "THING_DISABLED"
        | "OPERATION_NOT_ALLOWED"
        | "PERMISSION_DENIED"
        | "QUOTA_EXCEEDED"
        | "PLAN_LIMIT_EXCEEDED"
        | "ACL_NOT_EDITABLE"
        | "OWNER_CANNOT_LEAVE_GROUP"
        | "SERVER_CODE_DISABLED"
        | "EMAIL_NOT_VERIFIED"
        | "PHONE_NOT_VERIFIED"
        | "unauthorized_client" => 403,

        // 404
        "NOT_FOUND"
        | "APP_NOT_FOUND"
        | "BUCKET_NOT_FOUND"
        | "OBJECT_NOT_FOUND"
        | "OBJECT_BODY_NOT_FOUND"
        | "OBJECT_BODY_UPLOAD_NOT_FOUND"
        | "USER_NOT_FOUND"
        | "USER_ADDRESS_NOT_FOUND"
        | "GROUP_NOT_FOUND"
        | "GROUP_MEMBER_NOT_FOUND"
        | "TOPIC_NOT_FOUND"
        | "SUBSCRIPTION_NOT_FOUND"
        | "INSTALLATION_NOT_FOUND"
        | "THING_NOT_FOUND"
        | "THING_OWNER_NOT_FOUND"
        | "ACL_NOT_FOUND"
        | "ACL_ENTRY_NOT_FOUND"
        | "FILTER_NOT_FOUND"
        | "ENDPOINT_NOT_FOUND"
        | "SERVER_CODE_NOT_FOUND"
        | "SERVER_CODE_VERSION_NOT_FOUND"
        | "HOOK_NOT_FOUND"
        | "SCHEDULE_NOT_FOUND"
        | "PUSH_MESSAGE_NOT_FOUND"
        | "INDEX_NOT_FOUND"
        | "UPLOAD_ID_NOT_FOUND"
        | "PHONE_NUMBER_NOT_FOUND"
        | "EMAIL_NOT_FOUND"
        | "RESOURCE_NOT_FOUND" => 404,

        // 405 / 406
        "METHOD_NOT_ALLOWED" | "OPERATION_NOT_SUPPORTED" => 405,
        "NOT_ACCEPTABLE" | "UNSUPPORTED_ACCEPT_TYPE" => 406,

        // 409
        "CONFLICT"
        | "OBJECT_VERSION_IS_STALE"
        | "OBJECT_ALREADY_EXISTS"
        | "OBJECT_BODY_UPLOAD_IN_PROGRESS"
        | "BUCKET_ALREADY_EXISTS"
        | "USER_ALREADY_EXISTS"
        | "USER_ALREADY_MEMBER"
        | "LOGIN_NAME_ALREADY_EXISTS"
        | "EMAIL_ALREADY_EXISTS"
        | "PHONE_ALREADY_EXISTS"
        | "GROUP_ALREADY_EXISTS"
        | "TOPIC_ALREADY_EXISTS"
        | "ALREADY_SUBSCRIBED"
        | "ACL_ALREADY_EXISTS"
        | "THING_ALREADY_EXISTS"
        | "THING_ALREADY_OWNED"
        | "INSTALLATION_ALREADY_EXISTS"
        | "VENDOR_THING_ID_ALREADY_EXISTS"
        | "ENDPOINT_ALREADY_EXISTS"
        | "INDEX_ALREADY_EXISTS"
        | "STATE_CONFLICT"
        | "CONCURRENT_MODIFICATION" => 409,

        // 410 / 411 / 412 / 413 / 415 / 416
        "GONE" | "OBJECT_DELETED" | "SERVER_CODE_VERSION_DELETED" => 410,
        "LENGTH_REQUIRED" => 411,
        "PRECONDITION_FAILED" | "ETAG_MISMATCH" => 412,
        "ENTITY_TOO_LARGE" | "OBJECT_TOO_LARGE" | "OBJECT_BODY_TOO_LARGE" | "REQUEST_TOO_LARGE" => {
            413
        }
        "UNSUPPORTED_MEDIA_TYPE" => 415,
        "INVALID_RANGE" | "RANGE_NOT_SATISFIABLE" => 416,

        // 429
        "TOO_MANY_REQUESTS" | "RATE_LIMIT_EXCEEDED" => 429,

        // 500
        "INTERNAL_SERVER_ERROR"
        | "UNEXPECTED_EXCEPTION"
        | "UNEXPECTED_ERROR"
        | "DATABASE_ERROR"
        | "STORAGE_ERROR"
        | "SERVER_CODE_ERROR"
        | "SERVER_CODE_EXECUTION_ERROR"
        | "PUSH_DELIVERY_ERROR"
        | "server_error" => 500,

        // 501 / 502 / 503 / 504
        "NOT_IMPLEMENTED" => 501,
        "BAD_GATEWAY" | "UPSTREAM_ERROR" => 502,
        "SERVICE_UNAVAILABLE" | "MAINTENANCE" | "ENDPOINT_NOT_READY" | "temporarily_unavailable" => {
            503
        }
        "GATEWAY_TIMEOUT" | "SERVER_CODE_TIMEOUT" => 504,

        _ => return None,
    };
    Some(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_map_to_status() {
        let cases = [
            ("INVALID_INPUT_DATA", 400),
            ("WRONG_TOKEN", 401),
            ("USER_DISABLED", 403),
            ("OBJECT_NOT_FOUND", 404),
            ("OBJECT_VERSION_IS_STALE", 409),
            ("PRECONDITION_FAILED", 412),
            ("TOO_MANY_REQUESTS", 429),
            ("UNEXPECTED_EXCEPTION", 500),
            ("SERVICE_UNAVAILABLE", 503),
        ];

        for (code, status) in cases {
            assert_eq!(status_for_code(code), Some(status), "code {code}");
        }
    }

    #[test]
    fn unknown_code_is_none() {
        assert_eq!(status_for_code("NO_SUCH_CODE"), None);
        assert_eq!(status_for_code(""), None);
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert_eq!(status_for_code("object_not_found"), None);
    }
}
