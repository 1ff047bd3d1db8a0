pub mod subdomain;
