// Identity collaborator: JWT issuing and verification

pub mod jwt;

pub use jwt::*;
