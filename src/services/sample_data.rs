// src/services/sample_data.rs

/// Built-in dataset used when no CSV candidate can be loaded.
pub const SAMPLE_HISTORICAL_CSV: &str = "Date,Price
01/03/2011,0.30
01/03/2012,5.27
01/03/2013,13.30
01/03/2014,770.44
01/03/2015,314.25
01/03/2016,430.01
01/03/2017,1021.75
01/03/2018,14764.20
01/03/2019,3843.52
01/03/2020,7344.88
01/03/2021,32782.02
01/03/2022,46458.12
01/03/2023,16625.08
01/03/2024,44172.22
01/03/2025,97500.00
11/23/2011,2.48
11/23/2012,11.99
11/23/2013,798.62
11/23/2014,367.13
11/23/2015,323.87
11/23/2016,740.36
11/23/2017,8112.24
11/23/2018,4346.75
11/23/2019,7178.25
11/23/2020,18353.27
11/23/2021,56287.46
11/23/2022,16589.23
11/23/2023,37420.89
11/23/2024,99588.00
11/23/2025,98827.00";
