/**
 * Signing keys: generation, PEM persistence
 *  and the on-disk key directory.
 */
pub mod crypto;
/**
 * Extension identifiers, derived from the
 *  signing key the same way the browser does it.
 */
pub mod identity;
/**
 * Update-check responses and the URLs
 *  they point the browser at.
 */
pub mod manifest;
/**
 * Driving a browser binary to pack an
 *  extension and filing the result away.
 */
pub mod packager;
pub mod permissions;
/**
 * Managed-policy documents and where each
 *  browser vendor expects to find them.
 */
pub mod policy;
/**
 * Storage of packed
 *  artifacts, keyed by extension identifier.
 */
pub mod store;
