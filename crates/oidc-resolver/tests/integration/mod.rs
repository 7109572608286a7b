mod domain_resolution;
mod token_gates;
