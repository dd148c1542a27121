//! CQL statement text for the user/role keyspace
//!
//! Keyspace names are validated by `StoreConfig::validate` before they reach
//! this module, so they are interpolated unquoted.

/// Statement text bound to one keyspace
#[derive(Debug, Clone)]
pub struct Schema {
    keyspace: String,
    replication_factor: u32,
}

impl Schema {
    pub fn new(keyspace: impl Into<String>, replication_factor: u32) -> Self {
        Self {
            keyspace: keyspace.into(),
            replication_factor,
        }
    }

    pub fn keyspace(&self) -> &str {
        &self.keyspace
    }

    /// DDL in execution order; every statement is `IF NOT EXISTS`
    pub fn create_statements(&self, inverse_links: bool) -> Vec<String> {
        let ks = &self.keyspace;
        let mut statements = vec![
            format!(
                "CREATE KEYSPACE IF NOT EXISTS {ks} WITH REPLICATION = \
                 {{'class': 'SimpleStrategy', 'replication_factor': {}}}",
                self.replication_factor
            ),
            format!("CREATE TABLE IF NOT EXISTS {ks}.users (id uuid PRIMARY KEY, name text)"),
            format!("CREATE TABLE IF NOT EXISTS {ks}.roles (id uuid PRIMARY KEY, name text)"),
            format!(
                "CREATE TABLE IF NOT EXISTS {ks}.user_roles \
                 (user_id uuid, role_id uuid, PRIMARY KEY (user_id, role_id))"
            ),
        ];
        if inverse_links {
            statements.push(format!(
                "CREATE TABLE IF NOT EXISTS {ks}.role_users \
                 (role_id uuid, user_id uuid, PRIMARY KEY (role_id, user_id))"
            ));
        }
        statements
    }

    pub fn insert_user(&self) -> String {
        format!("INSERT INTO {}.users (id, name) VALUES (?, ?)", self.keyspace)
    }

    pub fn select_user(&self) -> String {
        format!("SELECT id, name FROM {}.users WHERE id = ?", self.keyspace)
    }

    pub fn update_user_name(&self) -> String {
        format!("UPDATE {}.users SET name = ? WHERE id = ?", self.keyspace)
    }

    pub fn delete_user(&self) -> String {
        format!("DELETE FROM {}.users WHERE id = ?", self.keyspace)
    }

    pub fn insert_role(&self) -> String {
        format!("INSERT INTO {}.roles (id, name) VALUES (?, ?)", self.keyspace)
    }

    pub fn select_role(&self) -> String {
        format!("SELECT id, name FROM {}.roles WHERE id = ?", self.keyspace)
    }

    pub fn insert_link(&self) -> String {
        format!(
            "INSERT INTO {}.user_roles (user_id, role_id) VALUES (?, ?)",
            self.keyspace
        )
    }

    pub fn select_links(&self) -> String {
        format!(
            "SELECT role_id FROM {}.user_roles WHERE user_id = ?",
            self.keyspace
        )
    }

    pub fn delete_links(&self) -> String {
        format!("DELETE FROM {}.user_roles WHERE user_id = ?", self.keyspace)
    }

    pub fn insert_inverse_link(&self) -> String {
        format!(
            "INSERT INTO {}.role_users (role_id, user_id) VALUES (?, ?)",
            self.keyspace
        )
    }

    pub fn select_inverse_links(&self) -> String {
        format!(
            "SELECT user_id FROM {}.role_users WHERE role_id = ?",
            self.keyspace
        )
    }

    pub fn delete_inverse_link(&self) -> String {
        format!(
            "DELETE FROM {}.role_users WHERE role_id = ? AND user_id = ?",
            self.keyspace
        )
    }
}
