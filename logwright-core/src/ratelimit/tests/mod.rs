mod limiter_tests;
