//! In-process store with the same semantics as [`PgStore`](super::PgStore).
//!
//! All state sits behind one mutex, so every repository call, including
//! multi-step ones like order placement, is atomic. Rows are kept in
//! insertion order and "newest first" listings iterate in reverse.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use rust_decimal::Decimal;

use ellectra_core::{
    CartLineId, CategoryId, Email, OrderId, OrderStatus, PaymentStatus, ProductId, UserId,
};

use super::{
    CartRepository, CatalogRepository, OrderRepository, RepositoryError, Store, UserRepository,
};
use crate::models::cart::{CartLine, CartLineDetail, NewCartLine};
use crate::models::catalog::{Category, NewCategory, NewProduct, Product};
use crate::models::order::{
    DeliveryUpdate, DeliveryUpdateOutcome, NewOrder, Order, PlacedOrder, StatusTotals,
};
use crate::models::user::{NewUser, ProfileUpdate, User};

#[derive(Debug, Default)]
struct MemoryState {
    users: Vec<User>,
    categories: Vec<Category>,
    products: Vec<Product>,
    cart_lines: Vec<CartLine>,
    orders: Vec<Order>,
}

/// Mutex-backed store for tests and local experiments.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn ids<'a, T, I>(items: impl Iterator<Item = &'a I>, id: impl Fn(&I) -> &T) -> HashSet<T>
where
    T: Clone + Eq + std::hash::Hash + 'a,
    I: 'a,
{
    items.map(|item| id(item).clone()).collect()
}

fn page<T: Clone>(items: impl Iterator<Item = T>, limit: i64, offset: i64) -> Vec<T> {
    let skip = usize::try_from(offset).unwrap_or(0);
    let take = usize::try_from(limit).unwrap_or(0);
    items.skip(skip).take(take).collect()
}

fn same_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

impl UserRepository for MemoryStore {
    async fn get_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .state()
            .users
            .iter()
            .find(|user| &user.user_email == email)
            .cloned())
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, RepositoryError> {
        let mut state = self.state();
        if state.users.iter().any(|user| user.user_email == new_user.email) {
            return Err(RepositoryError::Conflict("user already exists".to_owned()));
        }

        let existing = ids(state.users.iter(), |user: &User| &user.user_id);
        let user = User {
            user_id: UserId::generate_unique(&existing, &mut rand::rng())?,
            user_email: new_user.email,
            user_name: new_user.name,
            user_number: None,
            user_door_no: None,
            user_address: None,
            user_city: None,
            user_pincode: None,
            landmark: None,
            created_at: Utc::now(),
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn update_user_profile(
        &self,
        user_id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, RepositoryError> {
        let mut state = self.state();
        let Some(user) = state.users.iter_mut().find(|user| &user.user_id == user_id) else {
            return Ok(None);
        };

        if let Some(name) = &update.user_name {
            user.user_name.clone_from(name);
        }
        if update.user_number.is_some() {
            user.user_number = update.user_number;
        }
        if update.user_door_no.is_some() {
            user.user_door_no.clone_from(&update.user_door_no);
        }
        if update.user_address.is_some() {
            user.user_address.clone_from(&update.user_address);
        }
        if update.user_city.is_some() {
            user.user_city.clone_from(&update.user_city);
        }
        if update.user_pincode.is_some() {
            user.user_pincode.clone_from(&update.user_pincode);
        }
        if update.landmark.is_some() {
            user.landmark.clone_from(&update.landmark);
        }
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, user_id: &UserId) -> Result<bool, RepositoryError> {
        let mut state = self.state();
        let before = state.users.len();
        state.users.retain(|user| &user.user_id != user_id);
        if state.users.len() == before {
            return Ok(false);
        }
        state.cart_lines.retain(|line| &line.user_id != user_id);
        state.orders.retain(|order| &order.user_id != user_id);
        Ok(true)
    }
}

impl CatalogRepository for MemoryStore {
    async fn count_categories(&self) -> Result<u64, RepositoryError> {
        Ok(self.state().categories.len() as u64)
    }

    async fn list_categories(&self, limit: i64, offset: i64) -> Result<Vec<Category>, RepositoryError> {
        Ok(page(self.state().categories.iter().rev().cloned(), limit, offset))
    }

    async fn all_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let mut categories = self.state().categories.clone();
        categories.sort_by(|a, b| a.cat_name.cmp(&b.cat_name));
        Ok(categories)
    }

    async fn get_category(&self, id: &CategoryId) -> Result<Option<Category>, RepositoryError> {
        Ok(self
            .state()
            .categories
            .iter()
            .find(|category| &category.cat_id == id)
            .cloned())
    }

    async fn find_category_by_name(
        &self,
        name: &str,
        excluding: Option<&CategoryId>,
    ) -> Result<Option<Category>, RepositoryError> {
        Ok(self
            .state()
            .categories
            .iter()
            .find(|category| {
                same_name(&category.cat_name, name) && Some(&category.cat_id) != excluding
            })
            .cloned())
    }

    async fn insert_category(&self, category: NewCategory) -> Result<Category, RepositoryError> {
        let mut state = self.state();
        if state
            .categories
            .iter()
            .any(|existing| same_name(&existing.cat_name, &category.name))
        {
            return Err(RepositoryError::Conflict("category name already exists".to_owned()));
        }

        let existing = ids(state.categories.iter(), |c: &Category| &c.cat_id);
        let category = Category {
            cat_id: CategoryId::generate_unique(&existing, &mut rand::rng())?,
            cat_name: category.name,
            cat_img: category.image,
            created_at: Utc::now(),
        };
        state.categories.push(category.clone());
        Ok(category)
    }

    async fn update_category(
        &self,
        id: &CategoryId,
        category: NewCategory,
    ) -> Result<Option<Category>, RepositoryError> {
        let mut state = self.state();
        if state
            .categories
            .iter()
            .any(|existing| &existing.cat_id != id && same_name(&existing.cat_name, &category.name))
        {
            return Err(RepositoryError::Conflict("category name already exists".to_owned()));
        }

        let Some(stored) = state.categories.iter_mut().find(|c| &c.cat_id == id) else {
            return Ok(None);
        };
        stored.cat_name = category.name;
        stored.cat_img = category.image;
        Ok(Some(stored.clone()))
    }

    async fn delete_category(&self, id: &CategoryId) -> Result<Option<u64>, RepositoryError> {
        let mut state = self.state();
        let before = state.categories.len();
        state.categories.retain(|category| &category.cat_id != id);
        if state.categories.len() == before {
            return Ok(None);
        }

        let products_before = state.products.len();
        state.products.retain(|product| &product.cat_id != id);
        Ok(Some((products_before - state.products.len()) as u64))
    }

    async fn count_products(&self, category: Option<&CategoryId>) -> Result<u64, RepositoryError> {
        Ok(self
            .state()
            .products
            .iter()
            .filter(|product| category.is_none_or(|id| &product.cat_id == id))
            .count() as u64)
    }

    async fn list_products(
        &self,
        category: Option<&CategoryId>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let state = self.state();
        let matching = state
            .products
            .iter()
            .rev()
            .filter(|product| category.is_none_or(|id| &product.cat_id == id))
            .cloned();
        Ok(page(matching, limit, offset))
    }

    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self
            .state()
            .products
            .iter()
            .find(|product| &product.pro_id == id)
            .cloned())
    }

    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        Ok(self
            .state()
            .products
            .iter()
            .filter(|product| ids.contains(&product.pro_id))
            .cloned()
            .collect())
    }

    async fn find_product_by_name(
        &self,
        name: &str,
        excluding: Option<&ProductId>,
    ) -> Result<Option<Product>, RepositoryError> {
        Ok(self
            .state()
            .products
            .iter()
            .find(|product| {
                same_name(&product.product_name, name) && Some(&product.pro_id) != excluding
            })
            .cloned())
    }

    async fn search_products(&self, query: &str) -> Result<Vec<Product>, RepositoryError> {
        let needle = query.to_lowercase();
        let mut found: Vec<Product> = self
            .state()
            .products
            .iter()
            .filter(|product| {
                product.product_name.to_lowercase().contains(&needle)
                    || product.product_description.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| a.product_name.cmp(&b.product_name));
        Ok(found)
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let mut state = self.state();
        if state
            .products
            .iter()
            .any(|existing| same_name(&existing.product_name, &product.name))
        {
            return Err(RepositoryError::Conflict("product name already exists".to_owned()));
        }

        let existing = ids(state.products.iter(), |p: &Product| &p.pro_id);
        let product = Product {
            pro_id: ProductId::generate_unique(&existing, &mut rand::rng())?,
            cat_id: product.cat_id,
            product_name: product.name,
            product_description: product.description,
            price: product.price,
            product_img: product.image,
            created_at: Utc::now(),
        };
        state.products.push(product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        id: &ProductId,
        product: NewProduct,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut state = self.state();
        if state
            .products
            .iter()
            .any(|existing| &existing.pro_id != id && same_name(&existing.product_name, &product.name))
        {
            return Err(RepositoryError::Conflict("product name already exists".to_owned()));
        }

        let Some(stored) = state.products.iter_mut().find(|p| &p.pro_id == id) else {
            return Ok(None);
        };
        stored.cat_id = product.cat_id;
        stored.product_name = product.name;
        stored.product_description = product.description;
        stored.price = product.price;
        stored.product_img = product.image;
        Ok(Some(stored.clone()))
    }

    async fn delete_product(&self, id: &ProductId) -> Result<bool, RepositoryError> {
        let mut state = self.state();
        let before = state.products.len();
        state.products.retain(|product| &product.pro_id != id);
        Ok(state.products.len() < before)
    }
}

impl CartRepository for MemoryStore {
    async fn get_cart_line_for_product(
        &self,
        user_id: &UserId,
        pro_id: &ProductId,
    ) -> Result<Option<CartLine>, RepositoryError> {
        Ok(self
            .state()
            .cart_lines
            .iter()
            .find(|line| &line.user_id == user_id && &line.pro_id == pro_id)
            .cloned())
    }

    async fn get_cart_line(
        &self,
        user_id: &UserId,
        cart_id: &CartLineId,
    ) -> Result<Option<CartLine>, RepositoryError> {
        Ok(self
            .state()
            .cart_lines
            .iter()
            .find(|line| &line.user_id == user_id && &line.cart_id == cart_id)
            .cloned())
    }

    async fn insert_cart_line(&self, line: NewCartLine) -> Result<CartLine, RepositoryError> {
        let mut state = self.state();
        if state
            .cart_lines
            .iter()
            .any(|existing| existing.user_id == line.user_id && existing.pro_id == line.pro_id)
        {
            return Err(RepositoryError::Conflict("product is already in the cart".to_owned()));
        }

        let existing = ids(state.cart_lines.iter(), |l: &CartLine| &l.cart_id);
        let line = CartLine {
            cart_id: CartLineId::generate_unique(&existing, &mut rand::rng())?,
            user_id: line.user_id,
            pro_id: line.pro_id,
            quantity: line.quantity,
            total_price: line.total_price,
            created_at: Utc::now(),
        };
        state.cart_lines.push(line.clone());
        Ok(line)
    }

    async fn set_cart_line_quantity(
        &self,
        user_id: &UserId,
        cart_id: &CartLineId,
        quantity: i32,
        total_price: Decimal,
    ) -> Result<Option<CartLine>, RepositoryError> {
        let mut state = self.state();
        let Some(line) = state
            .cart_lines
            .iter_mut()
            .find(|line| &line.user_id == user_id && &line.cart_id == cart_id)
        else {
            return Ok(None);
        };
        line.quantity = quantity;
        line.total_price = total_price;
        Ok(Some(line.clone()))
    }

    async fn list_cart(&self, user_id: &UserId) -> Result<Vec<CartLineDetail>, RepositoryError> {
        let state = self.state();
        Ok(state
            .cart_lines
            .iter()
            .filter(|line| &line.user_id == user_id)
            .map(|line| {
                let product = state.products.iter().find(|p| p.pro_id == line.pro_id);
                CartLineDetail {
                    line: line.clone(),
                    product_name: product.map(|p| p.product_name.clone()),
                    product_img: product.map(|p| p.product_img.clone()),
                    price: product.map(|p| p.price.amount()),
                }
            })
            .collect())
    }

    async fn delete_cart_line(
        &self,
        user_id: &UserId,
        cart_id: &CartLineId,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.state();
        let before = state.cart_lines.len();
        state
            .cart_lines
            .retain(|line| !(&line.user_id == user_id && &line.cart_id == cart_id));
        Ok(state.cart_lines.len() < before)
    }
}

impl OrderRepository for MemoryStore {
    async fn place_order(&self, order: NewOrder) -> Result<PlacedOrder, RepositoryError> {
        let mut state = self.state();

        let existing = ids(state.orders.iter(), |o: &Order| &o.order_id);
        let order = Order {
            order_id: OrderId::generate_unique(&existing, &mut rand::rng())?,
            user_id: order.user_id,
            items: order.items,
            total_amount: order.total_amount,
            payment_status: order.payment_status,
            status: Some(OrderStatus::Pending),
            delivery: order.delivery,
            order_date: Utc::now(),
        };

        let before = state.cart_lines.len();
        state.cart_lines.retain(|line| {
            line.user_id != order.user_id
                || !order.items.iter().any(|item| item.pro_id == line.pro_id)
        });
        let cart_lines_removed = (before - state.cart_lines.len()) as u64;

        state.orders.push(order.clone());
        Ok(PlacedOrder {
            order,
            cart_lines_removed,
        })
    }

    async fn count_orders(
        &self,
        user_id: &UserId,
        status: Option<OrderStatus>,
    ) -> Result<u64, RepositoryError> {
        Ok(self
            .state()
            .orders
            .iter()
            .filter(|order| &order.user_id == user_id)
            .filter(|order| status.is_none() || order.status == status)
            .count() as u64)
    }

    async fn list_orders(
        &self,
        user_id: &UserId,
        status: Option<OrderStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Order>, RepositoryError> {
        let state = self.state();
        let matching = state
            .orders
            .iter()
            .rev()
            .filter(|order| &order.user_id == user_id)
            .filter(|order| status.is_none() || order.status == status)
            .cloned();
        Ok(page(matching, limit, offset))
    }

    async fn get_order(
        &self,
        user_id: &UserId,
        order_id: &OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        Ok(self
            .state()
            .orders
            .iter()
            .find(|order| &order.user_id == user_id && &order.order_id == order_id)
            .cloned())
    }

    async fn update_order_status(
        &self,
        user_id: &UserId,
        order_id: &OrderId,
        payment_status: Option<PaymentStatus>,
        status: Option<OrderStatus>,
    ) -> Result<Option<Order>, RepositoryError> {
        let mut state = self.state();
        let Some(order) = state
            .orders
            .iter_mut()
            .find(|order| &order.user_id == user_id && &order.order_id == order_id)
        else {
            return Ok(None);
        };
        if let Some(payment_status) = payment_status {
            order.payment_status = payment_status;
        }
        if status.is_some() {
            order.status = status;
        }
        Ok(Some(order.clone()))
    }

    async fn update_order_delivery(
        &self,
        user_id: &UserId,
        order_id: &OrderId,
        update: &DeliveryUpdate,
    ) -> Result<DeliveryUpdateOutcome, RepositoryError> {
        let mut state = self.state();
        let Some(order) = state
            .orders
            .iter_mut()
            .find(|order| &order.user_id == user_id && &order.order_id == order_id)
        else {
            return Ok(DeliveryUpdateOutcome::NotFound);
        };
        if !order.status.is_some_and(|s| s.is_modifiable()) {
            return Ok(DeliveryUpdateOutcome::NotModifiable(order.status));
        }

        if let Some(payment_status) = update.payment_status {
            order.payment_status = payment_status;
        }
        let delivery = &mut order.delivery;
        if update.delivery_address.is_some() {
            delivery.delivery_address.clone_from(&update.delivery_address);
        }
        if update.city.is_some() {
            delivery.city.clone_from(&update.city);
        }
        if update.pincode.is_some() {
            delivery.pincode.clone_from(&update.pincode);
        }
        if update.landmark.is_some() {
            delivery.landmark.clone_from(&update.landmark);
        }
        if let Some(delivery_type) = &update.delivery_type {
            delivery.delivery_type.clone_from(delivery_type);
        }
        Ok(DeliveryUpdateOutcome::Updated(order.clone()))
    }

    async fn delete_order(&self, user_id: &UserId, order_id: &OrderId) -> Result<bool, RepositoryError> {
        let mut state = self.state();
        let before = state.orders.len();
        state
            .orders
            .retain(|order| !(&order.user_id == user_id && &order.order_id == order_id));
        Ok(state.orders.len() < before)
    }

    async fn order_totals_by_status(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<StatusTotals>, RepositoryError> {
        let state = self.state();
        let mut groups: Vec<StatusTotals> = Vec::new();
        for order in state.orders.iter().filter(|order| &order.user_id == user_id) {
            if let Some(group) = groups.iter_mut().find(|group| group.status == order.status) {
                group.count += 1;
                group.total_amount += order.total_amount;
            } else {
                groups.push(StatusTotals {
                    status: order.status,
                    count: 1,
                    total_amount: order.total_amount,
                });
            }
        }
        groups.sort_by_key(StatusTotals::sort_key);
        Ok(groups)
    }
}
