//! Request DTOs for the storefront API
//!
//! Bodies arrive with every field optional so a missing field becomes a
//! domain error with a readable message rather than a decoder rejection.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::db::{Gender, NewOrder, NewProduct, NewUser, OrderItem, ProductPatch, Role, ShippingInfo};
use crate::error::{ApiError, ApiResult};

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// == Products ==
/// Body of `POST /product/new`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewProductRequest {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<u32>,
    pub category: Option<String>,
    pub description: Option<String>,
}

impl NewProductRequest {
    pub fn validate(self) -> ApiResult<NewProduct> {
        match (
            non_blank(self.name),
            self.price,
            self.stock,
            non_blank(self.category),
            non_blank(self.description),
        ) {
            (Some(name), Some(price), Some(stock), Some(category), Some(description))
                if price >= 0.0 =>
            {
                Ok(NewProduct {
                    name,
                    price,
                    stock,
                    category,
                    description,
                })
            }
            _ => Err(ApiError::BadRequest("Please enter All fields".into())),
        }
    }
}

/// Body of `PUT /product/:id`; absent fields are left as they are.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<u32>,
    pub category: Option<String>,
    pub description: Option<String>,
}

impl From<UpdateProductRequest> for ProductPatch {
    fn from(req: UpdateProductRequest) -> Self {
        ProductPatch {
            name: non_blank(req.name),
            price: req.price,
            stock: req.stock,
            category: non_blank(req.category),
            description: non_blank(req.description),
        }
    }
}

/// Body of `POST /product/review/new/:id`
#[derive(Debug, Clone, Deserialize)]
pub struct NewReviewRequest {
    #[serde(default)]
    pub comment: String,
    pub rating: Option<u8>,
}

impl NewReviewRequest {
    /// Rating between 1 and 5.
    pub fn rating(&self) -> ApiResult<u8> {
        match self.rating {
            Some(rating @ 1..=5) => Ok(rating),
            _ => Err(ApiError::BadRequest("Rating must be between 1 and 5".into())),
        }
    }
}

/// `?id=` query naming the acting user.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserIdQuery {
    pub id: Option<String>,
}

impl UserIdQuery {
    pub fn require(self) -> ApiResult<String> {
        non_blank(self.id).ok_or_else(|| ApiError::Unauthorized("Please login first".into()))
    }
}

// == Orders ==
/// Body of `POST /order/new`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderRequest {
    pub shipping_info: Option<ShippingInfo>,
    pub user: Option<String>,
    pub subtotal: Option<f64>,
    pub tax: Option<f64>,
    pub shipping_charges: Option<f64>,
    pub discount: Option<f64>,
    pub total: Option<f64>,
    #[serde(default)]
    pub order_items: Vec<OrderItem>,
}

impl NewOrderRequest {
    pub fn validate(self) -> ApiResult<NewOrder> {
        let missing = || ApiError::BadRequest("Please Enter All Fields".into());

        if self.order_items.is_empty() {
            return Err(missing());
        }
        Ok(NewOrder {
            shipping_info: self.shipping_info.ok_or_else(missing)?,
            user: non_blank(self.user).ok_or_else(missing)?,
            subtotal: self.subtotal.ok_or_else(missing)?,
            tax: self.tax.ok_or_else(missing)?,
            // Absent charges and discounts are zero
            shipping_charges: self.shipping_charges.unwrap_or(0.0),
            discount: self.discount.unwrap_or(0.0),
            total: self.total.ok_or_else(missing)?,
            order_items: self.order_items,
        })
    }
}

// == Coupons ==
/// Body of `POST /payment/coupon/new`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCouponRequest {
    pub coupon: Option<String>,
    pub amount: Option<f64>,
}

impl NewCouponRequest {
    pub fn validate(self) -> ApiResult<(String, f64)> {
        match (non_blank(self.coupon), self.amount) {
            (Some(code), Some(amount)) if amount > 0.0 => Ok((code, amount)),
            _ => Err(ApiError::BadRequest(
                "Please enter both coupon and amount".into(),
            )),
        }
    }
}

/// Body of `PUT /payment/coupon/:id`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCouponRequest {
    pub code: Option<String>,
    pub amount: Option<f64>,
}

/// `?coupon=` query of the discount lookup
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CouponQuery {
    pub coupon: Option<String>,
}

// == Users ==
/// Body of `POST /user/new`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub gender: Option<Gender>,
    pub role: Option<Role>,
    pub dob: Option<NaiveDate>,
}

impl NewUserRequest {
    pub fn validate(self) -> ApiResult<NewUser> {
        match (non_blank(self.name), non_blank(self.email), self.gender, self.dob) {
            (Some(name), Some(email), Some(gender), Some(dob)) => Ok(NewUser {
                name,
                email,
                gender,
                role: self.role.unwrap_or(Role::User),
                dob,
            }),
            _ => Err(ApiError::BadRequest("Please add all fields".into())),
        }
    }
}
