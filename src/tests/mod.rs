#[cfg(test)]
mod common;

#[cfg(test)]
mod parser_roundtrip_test;



#[cfg(test)]
mod boolean_proof_test;
