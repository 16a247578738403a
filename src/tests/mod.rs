mod test_calculation;

// Tests breakdown
// --------------------
// test_utils.rs: mock chain connection and token fixtures
// test_calculation.rs: constant product pricing and slippage bounds
// test_request.rs: user input validation
// test_builder.rs: router call construction and gas estimation
// test_executor.rs: full attempts through the state machine
