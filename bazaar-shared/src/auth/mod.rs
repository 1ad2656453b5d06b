/// Authentication and authorization
///
/// - `password`: Argon2id hashing and the minimum-strength policy
/// - `token`: opaque bearer token generation and at-rest hashing
/// - `middleware`: token resolution against the store, `AuthContext`
/// - `policy`: the role/action permission table

pub mod middleware;
pub mod password;
pub mod policy;
pub mod token;
