//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod activity_log;
pub mod admin_user;
pub mod category;
pub mod customer;
pub mod inventory;
pub mod order;
pub mod order_return;
pub mod permission;
pub mod product;
pub mod promotion;
pub mod promotion_product;
pub mod role;
pub mod role_permission;
pub mod subcategory;
pub mod warehouse;

// Re-export specific types to avoid conflicts
pub use activity_log::{Entity as ActivityLog, Model as ActivityLogModel};
pub use admin_user::{Entity as AdminUser, Model as AdminUserModel};
pub use category::{Entity as Category, Model as CategoryModel};
pub use customer::{Entity as Customer, MembershipTier, Model as CustomerModel};
pub use inventory::{Entity as Inventory, Model as InventoryModel};
pub use order::{Entity as Order, Model as OrderModel, OrderStatus};
pub use order_return::{Entity as Return, Model as ReturnModel, ReturnStatus};
pub use permission::{Entity as Permission, Model as PermissionModel};
pub use product::{Entity as Product, Model as ProductModel};
pub use promotion::{Entity as Promotion, Model as PromotionModel};
pub use promotion_product::Entity as PromotionProduct;
pub use role::{Entity as Role, Model as RoleModel};
pub use role_permission::Entity as RolePermission;
pub use subcategory::{Entity as Subcategory, Model as SubcategoryModel};
pub use warehouse::{Entity as Warehouse, Model as WarehouseModel};
