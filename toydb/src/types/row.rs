//! The single record type stored in the table.
//!
//! A row is serialized into a fixed-width buffer:
//!
//! - `id`: 8 bytes (i64, little-endian)
//! - `username`: 32 bytes (NUL-padded)
//! - `email`: 256 bytes (NUL-padded)
//!
//! Total: 296 bytes

/// Maximum username length in bytes.
pub const USERNAME_SIZE: usize = 32;

/// Maximum email length in bytes.
pub const EMAIL_SIZE: usize = 256;

const ID_SIZE: usize = 8;
const ID_OFFSET: usize = 0;
const USERNAME_OFFSET: usize = ID_OFFSET + ID_SIZE;
const EMAIL_OFFSET: usize = USERNAME_OFFSET + USERNAME_SIZE;

/// Serialized size of a row in bytes.
pub const ROW_SIZE: usize = ID_SIZE + USERNAME_SIZE + EMAIL_SIZE;

/// One user record.
#[derive(Clone, PartialEq, Eq)]
pub struct Row {
    pub id: i64,
    pub username: [u8; USERNAME_SIZE],
    pub email: [u8; EMAIL_SIZE],
}

impl Row {
    /// Build a row from string fields, NUL-padding each buffer.
    pub fn new(id: i64, username: &str, email: &str) -> Result<Self, RowError> {
        if username.len() > USERNAME_SIZE {
            return Err(RowError::UsernameTooLong(username.len()));
        }
        if email.len() > EMAIL_SIZE {
            return Err(RowError::EmailTooLong(email.len()));
        }

        let mut row = Self {
            id,
            username: [0u8; USERNAME_SIZE],
            email: [0u8; EMAIL_SIZE],
        };
        row.username[..username.len()].copy_from_slice(username.as_bytes());
        row.email[..email.len()].copy_from_slice(email.as_bytes());
        Ok(row)
    }

    /// The username up to the first NUL byte.
    #[must_use]
    pub fn username(&self) -> String {
        until_nul(&self.username)
    }

    /// The email up to the first NUL byte.
    #[must_use]
    pub fn email(&self) -> String {
        until_nul(&self.email)
    }

    /// Serialize the row into its fixed-width on-page form.
    #[must_use]
    pub fn serialize(&self) -> [u8; ROW_SIZE] {
        let mut buf = [0u8; ROW_SIZE];
        buf[ID_OFFSET..ID_OFFSET + ID_SIZE].copy_from_slice(&self.id.to_le_bytes());
        buf[USERNAME_OFFSET..USERNAME_OFFSET + USERNAME_SIZE].copy_from_slice(&self.username);
        buf[EMAIL_OFFSET..EMAIL_OFFSET + EMAIL_SIZE].copy_from_slice(&self.email);
        buf
    }

    /// Deserialize a row from its on-page form.
    ///
    /// # Panics
    /// Panics if `bytes` is shorter than `ROW_SIZE`.
    #[must_use]
    pub fn deserialize(bytes: &[u8]) -> Self {
        assert!(bytes.len() >= ROW_SIZE, "row buffer too short");

        let mut id = [0u8; ID_SIZE];
        id.copy_from_slice(&bytes[ID_OFFSET..ID_OFFSET + ID_SIZE]);
        let mut username = [0u8; USERNAME_SIZE];
        username.copy_from_slice(&bytes[USERNAME_OFFSET..USERNAME_OFFSET + USERNAME_SIZE]);
        let mut email = [0u8; EMAIL_SIZE];
        email.copy_from_slice(&bytes[EMAIL_OFFSET..EMAIL_OFFSET + EMAIL_SIZE]);

        Self {
            id: i64::from_le_bytes(id),
            username,
            email,
        }
    }
}

fn until_nul(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

impl std::fmt::Display for Row {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.id, self.username(), self.email())
    }
}

impl std::fmt::Debug for Row {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Row")
            .field("id", &self.id)
            .field("username", &self.username())
            .field("email", &self.email())
            .finish()
    }
}

/// Errors from building a row out of string fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    /// Username longer than `USERNAME_SIZE` bytes.
    UsernameTooLong(usize),
    /// Email longer than `EMAIL_SIZE` bytes.
    EmailTooLong(usize),
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UsernameTooLong(len) => {
                write!(f, "username too long: {len} bytes (max {USERNAME_SIZE})")
            }
            Self::EmailTooLong(len) => write!(f, "email too long: {len} bytes (max {EMAIL_SIZE})"),
        }
    }
}

impl std::error::Error for RowError {}
