//! UnionID lookup after payment

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::{Operation, API_HOST};
use crate::error::WechatError;
use crate::types::{QueryParams, RequestBody};

const PAID_UNIONID_ENDPOINT: &str = "wxa/getpaidunionid";

/// Get a user's UnionID after they paid
///
/// GET /wxa/getpaidunionid. The order is identified either by the WeChat Pay
/// `transaction_id` or by `mch_id` plus `out_trade_no`.
#[derive(Debug, Clone, Default)]
pub struct PaidUnionId {
    pub openid: String,
    pub transaction_id: Option<String>,
    pub mch_id: Option<String>,
    pub out_trade_no: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaidUnionIdResponse {
    #[serde(default)]
    pub unionid: String,
}

impl PaidUnionId {
    pub fn by_transaction(openid: impl Into<String>, transaction_id: impl Into<String>) -> Self {
        Self {
            openid: openid.into(),
            transaction_id: Some(transaction_id.into()),
            ..Default::default()
        }
    }

    pub fn by_trade_no(
        openid: impl Into<String>,
        mch_id: impl Into<String>,
        out_trade_no: impl Into<String>,
    ) -> Self {
        Self {
            openid: openid.into(),
            mch_id: Some(mch_id.into()),
            out_trade_no: Some(out_trade_no.into()),
            ..Default::default()
        }
    }
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

impl Operation for PaidUnionId {
    fn name(&self) -> &'static str {
        "paid_unionid"
    }

    fn validate(&self) -> Result<(), WechatError> {
        if self.openid.is_empty() {
            return Err(WechatError::validation(&["openid"]));
        }
        let by_trade_no = present(&self.mch_id) && present(&self.out_trade_no);
        if !present(&self.transaction_id) && !by_trade_no {
            return Err(WechatError::Validation(
                "either transaction_id or mch_id with out_trade_no is required".to_string(),
            ));
        }
        Ok(())
    }

    fn body(&self) -> Result<Option<RequestBody>, WechatError> {
        Ok(None)
    }

    fn base_uri(&self) -> &str {
        API_HOST
    }

    fn endpoint(&self) -> &str {
        PAID_UNIONID_ENDPOINT
    }

    fn method(&self) -> Method {
        Method::GET
    }

    fn params(&self) -> QueryParams {
        let mut params = QueryParams::new().with("openid", self.openid.as_str());
        let optional = [
            ("transaction_id", &self.transaction_id),
            ("mch_id", &self.mch_id),
            ("out_trade_no", &self.out_trade_no),
        ];
        for (key, value) in optional {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                params.set(key, value);
            }
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_transaction_params() {
        let op = PaidUnionId::by_transaction("o1", "4200001");
        assert!(op.validate().is_ok());
        assert_eq!(op.params().encode(), "openid=o1&transaction_id=4200001");
        assert_eq!(op.method(), Method::GET);
    }

    #[test]
    fn test_by_trade_no_params() {
        let op = PaidUnionId::by_trade_no("o1", "1230000109", "T-1");
        assert!(op.validate().is_ok());
        assert_eq!(
            op.params().encode(),
            "mch_id=1230000109&openid=o1&out_trade_no=T-1"
        );
    }

    #[test]
    fn test_requires_order_reference() {
        let op = PaidUnionId {
            openid: "o1".to_string(),
            mch_id: Some("1230000109".to_string()),
            ..Default::default()
        };
        assert!(matches!(op.validate(), Err(WechatError::Validation(_))));
        assert!(PaidUnionId::default().validate().is_err());
    }
}
